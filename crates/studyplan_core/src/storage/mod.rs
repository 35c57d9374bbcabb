//! Key-value document storage and cross-instance change notification.
//!
//! # Responsibility
//! - Define the raw storage contract (`DocumentStorage`) used by the
//!   persistence adapter.
//! - Provide SQLite-backed and in-process backends.
//! - Name the three documents the store persists.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings at this layer; JSON handling lives in
//!   `PersistenceAdapter`.
//! - `poll_external_changes` never reports writes made through the same
//!   storage instance.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod adapter;
pub mod memory;
pub mod sqlite;

pub use adapter::{ExternalChangeCallback, PersistenceAdapter};
pub use memory::{MemoryDocumentStorage, MemoryStorageHub};
pub use sqlite::SqliteDocumentStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// The three independent documents persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Schedule,
    ExtraClasses,
    Notes,
}

impl DocumentKey {
    pub const ALL: [DocumentKey; 3] = [Self::Schedule, Self::ExtraClasses, Self::Notes];

    /// Storage key the document lives under.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Schedule => "app_schedule_v1",
            Self::ExtraClasses => "app_extra_v1",
            Self::Notes => "app_notes_v1",
        }
    }

    /// Document name used in logs and change events.
    pub fn name(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::ExtraClasses => "extraClasses",
            Self::Notes => "notes",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|document| document.storage_key() == key)
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Schedule => 0,
            Self::ExtraClasses => 1,
            Self::Notes => 2,
        }
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value written to `key` by another storage instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub key: String,
    pub new_value: String,
}

#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    QuotaExceeded { limit_bytes: usize, required_bytes: usize },
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                limit_bytes,
                required_bytes,
            } => write!(
                f,
                "storage quota exceeded: {required_bytes} bytes required, limit is {limit_bytes}"
            ),
            Self::Unavailable(details) => write!(f, "storage unavailable: {details}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Raw key-value storage shared by every running instance on the device.
pub trait DocumentStorage {
    /// Returns the stored value, or `None` when the key was never written.
    fn read(&mut self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces the value stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Returns the current value of each key other instances wrote since the
    /// last poll, in the order this storage observed them.
    ///
    /// A key is reported at most once per poll. Removed keys are not
    /// reported.
    fn poll_external_changes(&mut self) -> StorageResult<Vec<ExternalChange>>;
}
