//! Extra (private tutoring) class model.
//!
//! # Invariants
//! - `id` is unique within the collection and never reused.
//! - `day_id` is a soft reference to one of `WEEKDAYS`; it is not enforced by
//!   the store.
//! - `time` is `HH:MM` (24h). It only orders classes within a day; overlapping
//!   classes are allowed.

use crate::model::calendar::weekday_by_id;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]$").expect("valid clock time regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraClass {
    pub id: String,
    pub day_id: String,
    pub time: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Input problems detected by [`ExtraClass::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraClassValidationError {
    UnknownDay(String),
    InvalidTime(String),
    EmptySubject,
}

impl Display for ExtraClassValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDay(day_id) => write!(f, "unknown day id `{day_id}`"),
            Self::InvalidTime(time) => write!(f, "time `{time}` is not HH:MM"),
            Self::EmptySubject => write!(f, "subject must not be empty"),
        }
    }
}

impl Error for ExtraClassValidationError {}

impl ExtraClass {
    /// Creates an entry with a freshly generated UUID v4 id.
    pub fn new(
        day_id: impl Into<String>,
        time: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), day_id, time, subject)
    }

    /// Creates an entry with a caller-provided id.
    pub fn with_id(
        id: impl Into<String>,
        day_id: impl Into<String>,
        time: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            day_id: day_id.into(),
            time: time.into(),
            subject: subject.into(),
            location: None,
            note: None,
        }
    }

    /// Checks user-entered fields.
    ///
    /// The store accepts any entry; this is for entry points fed by raw input.
    pub fn validate(&self) -> Result<(), ExtraClassValidationError> {
        if weekday_by_id(&self.day_id).is_none() {
            return Err(ExtraClassValidationError::UnknownDay(self.day_id.clone()));
        }
        if !is_clock_time(&self.time) {
            return Err(ExtraClassValidationError::InvalidTime(self.time.clone()));
        }
        if self.subject.trim().is_empty() {
            return Err(ExtraClassValidationError::EmptySubject);
        }
        Ok(())
    }
}

/// Partial update for an extra class; each `Some` field overwrites the target.
///
/// The id is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraClassPatch {
    pub day_id: Option<String>,
    pub time: Option<String>,
    pub subject: Option<String>,
    pub location: Option<Option<String>>,
    pub note: Option<Option<String>>,
}

impl ExtraClassPatch {
    /// Merges present fields into `entry`. Returns whether anything changed.
    pub fn apply_to(&self, entry: &mut ExtraClass) -> bool {
        let before = entry.clone();
        if let Some(day_id) = &self.day_id {
            entry.day_id = day_id.clone();
        }
        if let Some(time) = &self.time {
            entry.time = time.clone();
        }
        if let Some(subject) = &self.subject {
            entry.subject = subject.clone();
        }
        if let Some(location) = &self.location {
            entry.location = location.clone();
        }
        if let Some(note) = &self.note {
            entry.note = note.clone();
        }
        *entry != before
    }
}

/// Whether `value` is a zero-padded 24h `HH:MM` time.
pub fn is_clock_time(value: &str) -> bool {
    CLOCK_TIME_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_clock_time, ExtraClass, ExtraClassPatch, ExtraClassValidationError};

    #[test]
    fn clock_time_accepts_24h_values() {
        assert!(is_clock_time("00:00"));
        assert!(is_clock_time("17:45"));
        assert!(is_clock_time("23:59"));
        assert!(!is_clock_time("24:00"));
        assert!(!is_clock_time("7:30"));
        assert!(!is_clock_time("07:60"));
    }

    #[test]
    fn new_generates_distinct_ids() {
        let a = ExtraClass::new("mon", "18:00", "Math");
        let b = ExtraClass::new("mon", "18:00", "Math");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn validate_reports_first_problem() {
        let mut entry = ExtraClass::with_id("e1", "xyz", "18:00", "Math");
        assert_eq!(
            entry.validate(),
            Err(ExtraClassValidationError::UnknownDay("xyz".to_string()))
        );

        entry.day_id = "fri".to_string();
        entry.time = "6pm".to_string();
        assert!(matches!(
            entry.validate(),
            Err(ExtraClassValidationError::InvalidTime(_))
        ));

        entry.time = "18:00".to_string();
        entry.subject = "   ".to_string();
        assert_eq!(entry.validate(), Err(ExtraClassValidationError::EmptySubject));
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut entry = ExtraClass::with_id("e1", "mon", "18:00", "Math");
        entry.location = Some("Room 3".to_string());

        let patch = ExtraClassPatch {
            time: Some("19:30".to_string()),
            ..ExtraClassPatch::default()
        };
        assert!(patch.apply_to(&mut entry));
        assert_eq!(entry.id, "e1");
        assert_eq!(entry.time, "19:30");
        assert_eq!(entry.subject, "Math");
        assert_eq!(entry.location.as_deref(), Some("Room 3"));
    }
}
