//! Static calendar constants shared by every collection.
//!
//! # Invariants
//! - The seven weekday ids are persisted inside documents; they must stay
//!   stable across versions.
//! - `WEEKDAYS` order is the display and storage order of the schedule.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Number of periods in one session (morning or afternoon).
pub const PERIODS_PER_SESSION: usize = 5;

/// One fixed weekday: stable id plus display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weekday {
    pub id: &'static str,
    pub name: &'static str,
}

/// Ordered weekday list, Monday first.
pub static WEEKDAYS: [Weekday; 7] = [
    Weekday {
        id: "mon",
        name: "Thứ 2",
    },
    Weekday {
        id: "tue",
        name: "Thứ 3",
    },
    Weekday {
        id: "wed",
        name: "Thứ 4",
    },
    Weekday {
        id: "thu",
        name: "Thứ 5",
    },
    Weekday {
        id: "fri",
        name: "Thứ 6",
    },
    Weekday {
        id: "sat",
        name: "Thứ 7",
    },
    Weekday {
        id: "sun",
        name: "CN",
    },
];

/// Sticky-note palette tokens. The first entry is the default for new notes.
pub const NOTE_COLORS: [&str; 8] = [
    "bg-rose-100 text-rose-900",
    "bg-orange-100 text-orange-900",
    "bg-amber-100 text-amber-900",
    "bg-emerald-100 text-emerald-900",
    "bg-cyan-100 text-cyan-900",
    "bg-blue-100 text-blue-900",
    "bg-violet-100 text-violet-900",
    "bg-fuchsia-100 text-fuchsia-900",
];

pub const DEFAULT_NOTE_COLOR: &str = NOTE_COLORS[0];

/// Half of a school day. Each session holds exactly
/// [`PERIODS_PER_SESSION`] periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Morning,
    Afternoon,
}

impl Session {
    pub const ALL: [Session; 2] = [Session::Morning, Session::Afternoon];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }

    /// Parses the persisted/FFI form (`morning|afternoon`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            _ => None,
        }
    }
}

impl Display for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a weekday by its stable id.
pub fn weekday_by_id(id: &str) -> Option<&'static Weekday> {
    WEEKDAYS.iter().find(|day| day.id == id)
}

/// Palette position of a note color token.
///
/// Unknown or stale tokens return `None`; callers fall back to unstyled
/// rendering instead of failing.
pub fn note_color_index(color: &str) -> Option<usize> {
    NOTE_COLORS.iter().position(|token| *token == color)
}
