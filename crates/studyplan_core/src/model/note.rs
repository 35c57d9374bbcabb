//! Sticky note model.
//!
//! # Invariants
//! - `id` is unique and never reused.
//! - `created_at` is set once (epoch milliseconds) and never modified.
//! - `color` is free text; it is expected to be one of `NOTE_COLORS` but is
//!   never validated on write.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    pub created_at: i64,
    pub color: String,
}

impl Note {
    /// Creates a note with a generated id, stamped with the current time.
    pub fn new(content: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            created_at: now_epoch_ms(),
            color: color.into(),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
///
/// Clocks set before 1970 yield `0` rather than failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
