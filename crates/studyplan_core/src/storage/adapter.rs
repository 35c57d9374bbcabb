//! Typed JSON persistence over a [`DocumentStorage`].
//!
//! # Responsibility
//! - Load and save whole documents as JSON.
//! - Fan external changes out to per-key subscribers.
//!
//! # Invariants
//! - `load` never fails: unreadable or malformed values are reported as absent.
//! - `save` never fails: write errors are logged and the caller keeps its
//!   in-memory state.
//! - Subscribers are only invoked for changes made by other instances.

use super::{DocumentKey, DocumentStorage};
use log::{error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Receives the new raw value of a key written by another instance.
pub type ExternalChangeCallback = Box<dyn FnMut(&str) + Send>;

pub struct PersistenceAdapter<S: DocumentStorage> {
    storage: S,
    subscribers: Vec<(DocumentKey, ExternalChangeCallback)>,
}

impl<S: DocumentStorage> PersistenceAdapter<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            subscribers: Vec::new(),
        }
    }

    /// Reads and decodes one document. `None` when absent or unusable.
    pub fn load<T: DeserializeOwned>(&mut self, key: DocumentKey) -> Option<T> {
        let raw = match self.storage.read(key.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(
                    "event=document_read module=storage status=absent key={}",
                    key.storage_key()
                );
                return None;
            }
            Err(err) => {
                error!(
                    "event=document_read module=storage status=error key={} error={}",
                    key.storage_key(),
                    err
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=document_decode module=storage status=malformed key={} bytes={} error={}",
                    key.storage_key(),
                    raw.len(),
                    err
                );
                None
            }
        }
    }

    /// Encodes and writes one whole document. Returns whether it was stored.
    pub fn save<T: Serialize + ?Sized>(&mut self, key: DocumentKey, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                error!(
                    "event=document_encode module=storage status=error key={} error={}",
                    key.storage_key(),
                    err
                );
                return false;
            }
        };

        match self.storage.write(key.storage_key(), &raw) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=document_write module=storage status=error key={} bytes={} error={}",
                    key.storage_key(),
                    raw.len(),
                    err
                );
                false
            }
        }
    }

    /// Registers `callback` for values other instances write to `key`.
    pub fn subscribe_external_change(
        &mut self,
        key: DocumentKey,
        callback: ExternalChangeCallback,
    ) {
        self.subscribers.push((key, callback));
    }

    /// Polls the storage and delivers each external change to the
    /// subscribers of its key, in broadcast order.
    ///
    /// Returns the number of changes delivered to at least one subscriber.
    pub fn dispatch_external_changes(&mut self) -> usize {
        let changes = match self.storage.poll_external_changes() {
            Ok(changes) => changes,
            Err(err) => {
                error!("event=external_poll module=storage status=error error={err}");
                return 0;
            }
        };

        let mut delivered = 0;
        for change in changes {
            let Some(key) = DocumentKey::from_storage_key(&change.key) else {
                continue;
            };
            let mut matched = false;
            for (_, callback) in self
                .subscribers
                .iter_mut()
                .filter(|(subscribed, _)| *subscribed == key)
            {
                callback(&change.new_value);
                matched = true;
            }
            if matched {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::PersistenceAdapter;
    use crate::storage::{DocumentKey, DocumentStorage, MemoryStorageHub};
    use std::sync::{Arc, Mutex};

    #[test]
    fn malformed_json_loads_as_absent() {
        let hub = MemoryStorageHub::new();
        hub.connect().write("app_notes_v1", "{not json").unwrap();

        let mut adapter = PersistenceAdapter::new(hub.connect());
        let loaded: Option<Vec<String>> = adapter.load(DocumentKey::Notes);
        assert!(loaded.is_none());
    }

    #[test]
    fn save_failure_is_swallowed() {
        let hub = MemoryStorageHub::with_quota(4);
        let mut adapter = PersistenceAdapter::new(hub.connect());
        assert!(!adapter.save(DocumentKey::Notes, &vec!["too long for quota"]));
        assert!(hub.raw_value("app_notes_v1").is_none());
    }

    #[test]
    fn dispatch_routes_changes_by_key() {
        let hub = MemoryStorageHub::new();
        let mut writer = hub.connect();
        let mut adapter = PersistenceAdapter::new(hub.connect());

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        adapter.subscribe_external_change(
            DocumentKey::Notes,
            Box::new(move |raw| sink.lock().unwrap().push(raw.to_string())),
        );

        writer.write("app_schedule_v1", "[]").unwrap();
        writer.write("app_notes_v1", "[1]").unwrap();
        writer.write("unrelated", "x").unwrap();

        assert_eq!(adapter.dispatch_external_changes(), 1);
        assert_eq!(*received.lock().unwrap(), vec!["[1]".to_string()]);
    }
}
