//! SQLite-backed document storage.
//!
//! # Responsibility
//! - Persist raw documents in the `documents` table.
//! - Detect writes committed by other connections to the same database file.
//!
//! # Invariants
//! - `PRAGMA data_version` only changes for commits made by *other*
//!   connections, so this connection's own writes never show up as external
//!   changes.
//! - `last_seen` holds the last value this connection read, wrote or
//!   reported for each key; a key is reported only when its value differs.
//! - Every write bumps the row's `revision` past all others, so a poll
//!   reports changes in write order.

use super::{DocumentStorage, ExternalChange, StorageResult};
use crate::db::{open_db, open_db_in_memory, DbResult};
use log::debug;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

pub struct SqliteDocumentStorage {
    conn: Connection,
    data_version: i64,
    last_seen: HashMap<String, String>,
}

impl SqliteDocumentStorage {
    /// Opens (or creates) the document database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a private in-memory database; no external changes are possible.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps a migrated connection.
    pub fn from_connection(conn: Connection) -> DbResult<Self> {
        let data_version = read_data_version(&conn)?;
        Ok(Self {
            conn,
            data_version,
            last_seen: HashMap::new(),
        })
    }
}

impl DocumentStorage for SqliteDocumentStorage {
    fn read(&mut self, key: &str) -> StorageResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM documents WHERE key = ?1;")?;
        let mut rows = stmt.query([key])?;
        let value = match rows.next()? {
            Some(row) => Some(row.get::<_, String>(0)?),
            None => None,
        };

        match &value {
            Some(raw) => {
                self.last_seen.insert(key.to_string(), raw.clone());
            }
            None => {
                self.last_seen.remove(key);
            }
        }
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO documents (key, value, updated_at, revision)
             VALUES (
                ?1,
                ?2,
                CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER),
                (SELECT COALESCE(MAX(revision), 0) + 1 FROM documents)
             )
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                revision = excluded.revision;",
            params![key, value],
        )?;
        self.last_seen.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn poll_external_changes(&mut self) -> StorageResult<Vec<ExternalChange>> {
        let current = read_data_version(&self.conn)?;
        if current == self.data_version {
            return Ok(Vec::new());
        }
        self.data_version = current;

        let mut stmt = self
            .conn
            .prepare_cached("SELECT key, value FROM documents ORDER BY revision ASC, key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut present = Vec::new();
        let mut changes = Vec::new();

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            present.push(key.clone());
            if self.last_seen.get(&key) != Some(&value) {
                self.last_seen.insert(key.clone(), value.clone());
                changes.push(ExternalChange {
                    key,
                    new_value: value,
                });
            }
        }

        self.last_seen.retain(|key, _| present.contains(key));

        debug!(
            "event=storage_poll module=storage status=ok data_version={} changes={}",
            current,
            changes.len()
        );
        Ok(changes)
    }
}

fn read_data_version(conn: &Connection) -> DbResult<i64> {
    let version = conn.query_row("PRAGMA data_version;", [], |row| row.get::<_, i64>(0))?;
    Ok(version)
}
