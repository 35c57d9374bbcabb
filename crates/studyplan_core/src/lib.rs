//! Core state store for the study planner.
//! This crate is the single source of truth for schedule, extra-class and
//! note invariants; UI layers only read state and call store operations.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod projection;
pub mod storage;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::calendar::{
    note_color_index, weekday_by_id, Session, Weekday, DEFAULT_NOTE_COLOR, NOTE_COLORS,
    PERIODS_PER_SESSION, WEEKDAYS,
};
pub use model::extra_class::{ExtraClass, ExtraClassPatch, ExtraClassValidationError};
pub use model::note::Note;
pub use model::schedule::{
    default_schedule, validate_schedule, DaySchedule, Period, PeriodPatch, ScheduleShapeError,
};
pub use projection::{group_extra_classes_by_day, ExtraClassDayGroup};
pub use storage::{
    DocumentKey, DocumentStorage, ExternalChange, MemoryDocumentStorage, MemoryStorageHub,
    PersistenceAdapter, SqliteDocumentStorage, StorageError, StorageResult,
};
pub use store::{AppState, AppStore, ChangeOrigin, DocumentState, StoreChange, SubscriptionId};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
