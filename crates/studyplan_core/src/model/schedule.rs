//! Weekly schedule model: days, sessions and periods.
//!
//! # Responsibility
//! - Define the persisted shape of the weekly grid.
//! - Synthesize the default (empty) week.
//! - Validate documents loaded from storage before they replace memory state.
//!
//! # Invariants
//! - A schedule has exactly one `DaySchedule` per entry of `WEEKDAYS`, in order.
//! - Every day has exactly `PERIODS_PER_SESSION` morning and afternoon periods.
//! - Period ids are `"{day}-{session}-{n}"` with 1-based `n`; they are only
//!   generated by synthesis and never rewritten afterwards.

use crate::model::calendar::{Session, PERIODS_PER_SESSION, WEEKDAYS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One teaching slot at a fixed position inside a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub id: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Reserved; always `true` for synthesized periods.
    pub is_active: bool,
}

impl Period {
    /// Creates an empty, active period for one grid slot.
    ///
    /// `slot` is the 0-based index inside the session.
    pub fn empty(day_id: &str, session: Session, slot: usize) -> Self {
        Self {
            id: period_id(day_id, session, slot),
            subject: String::new(),
            room: None,
            note: None,
            is_active: true,
        }
    }
}

/// One weekday column of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub id: String,
    pub name: String,
    pub morning: Vec<Period>,
    pub afternoon: Vec<Period>,
}

impl DaySchedule {
    pub fn session(&self, session: Session) -> &[Period] {
        match session {
            Session::Morning => &self.morning,
            Session::Afternoon => &self.afternoon,
        }
    }

    pub fn session_mut(&mut self, session: Session) -> &mut Vec<Period> {
        match session {
            Session::Morning => &mut self.morning,
            Session::Afternoon => &mut self.afternoon,
        }
    }
}

/// Partial update for a period; each `Some` field overwrites the target.
///
/// `room` and `note` are optional on the period itself, so the patch uses
/// `Some(None)` to clear them and `Some(Some(value))` to set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodPatch {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub room: Option<Option<String>>,
    pub note: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl PeriodPatch {
    /// Patch that only sets the subject.
    pub fn subject(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Merges present fields into `period`. Returns whether anything changed.
    pub fn apply_to(&self, period: &mut Period) -> bool {
        let before = period.clone();
        if let Some(id) = &self.id {
            period.id = id.clone();
        }
        if let Some(subject) = &self.subject {
            period.subject = subject.clone();
        }
        if let Some(room) = &self.room {
            period.room = room.clone();
        }
        if let Some(note) = &self.note {
            period.note = note.clone();
        }
        if let Some(is_active) = self.is_active {
            period.is_active = is_active;
        }
        *period != before
    }
}

/// Builds the stable id of one grid slot. `slot` is 0-based.
pub fn period_id(day_id: &str, session: Session, slot: usize) -> String {
    format!("{day_id}-{}-{}", session.as_str(), slot + 1)
}

/// Synthesizes the empty week: 7 days, 5 + 5 empty active periods each.
///
/// Deterministic: two calls produce identical schedules, ids included.
pub fn default_schedule() -> Vec<DaySchedule> {
    WEEKDAYS
        .iter()
        .map(|day| DaySchedule {
            id: day.id.to_string(),
            name: day.name.to_string(),
            morning: (0..PERIODS_PER_SESSION)
                .map(|slot| Period::empty(day.id, Session::Morning, slot))
                .collect(),
            afternoon: (0..PERIODS_PER_SESSION)
                .map(|slot| Period::empty(day.id, Session::Afternoon, slot))
                .collect(),
        })
        .collect()
}

/// Shape violation found in a schedule document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleShapeError {
    DayCount(usize),
    DayOrder { position: usize, found: String },
    SessionLength {
        day_id: String,
        session: Session,
        len: usize,
    },
}

impl Display for ScheduleShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DayCount(count) => {
                write!(f, "expected {} days, found {count}", WEEKDAYS.len())
            }
            Self::DayOrder { position, found } => write!(
                f,
                "day at position {position} must be `{}`, found `{found}`",
                WEEKDAYS[*position].id
            ),
            Self::SessionLength {
                day_id,
                session,
                len,
            } => write!(
                f,
                "{day_id} {session} must have {PERIODS_PER_SESSION} periods, found {len}"
            ),
        }
    }
}

impl Error for ScheduleShapeError {}

/// Checks the fixed 7-day / 5+5 shape and weekday order.
pub fn validate_schedule(days: &[DaySchedule]) -> Result<(), ScheduleShapeError> {
    if days.len() != WEEKDAYS.len() {
        return Err(ScheduleShapeError::DayCount(days.len()));
    }

    for (position, (day, expected)) in days.iter().zip(WEEKDAYS.iter()).enumerate() {
        if day.id != expected.id {
            return Err(ScheduleShapeError::DayOrder {
                position,
                found: day.id.clone(),
            });
        }
        for session in Session::ALL {
            let len = day.session(session).len();
            if len != PERIODS_PER_SESSION {
                return Err(ScheduleShapeError::SessionLength {
                    day_id: day.id.clone(),
                    session,
                    len,
                });
            }
        }
    }

    Ok(())
}
