//! Domain model for the weekly schedule, extra classes and notes.
//!
//! # Responsibility
//! - Define the persisted document shapes.
//! - Hold the static weekday list and note palette.
//!
//! # Invariants
//! - JSON field names are camelCase so documents written by earlier app
//!   versions load unchanged.
//! - Weekday ids are the only link between collections.

pub mod calendar;
pub mod extra_class;
pub mod note;
pub mod schedule;
