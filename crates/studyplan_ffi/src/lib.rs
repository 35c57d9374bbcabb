//! Flutter-facing bindings for the study planner core.

pub mod api;
