//! In-process key-value storage shared by several contexts.
//!
//! A `MemoryStorageHub` plays the role of the device-wide storage; every
//! `MemoryDocumentStorage` connected to it is one running instance. A write
//! from one context marks the key dirty for every other context, never for
//! itself. Polling reports the key's current value, and skips keys whose
//! latest write came from the polling context.

use super::{DocumentStorage, ExternalChange, StorageError, StorageResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct HubState {
    values: HashMap<String, String>,
    last_writer: HashMap<String, u64>,
    queues: HashMap<u64, VecDeque<String>>,
    next_context_id: u64,
    quota_bytes: Option<usize>,
}

impl HubState {
    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        let others: usize = self
            .values
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, stored)| existing.len() + stored.len())
            .sum();
        others + key.len() + value.len()
    }
}

/// Shared storage space. Cloning yields another handle to the same space.
#[derive(Clone, Default)]
pub struct MemoryStorageHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryStorageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hub that rejects writes once keys + values exceed
    /// `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        let hub = Self::default();
        if let Ok(mut state) = hub.state.lock() {
            state.quota_bytes = Some(quota_bytes);
        }
        hub
    }

    /// Opens a new context (one running instance) on this hub.
    pub fn connect(&self) -> MemoryDocumentStorage {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let context_id = state.next_context_id;
        state.next_context_id += 1;
        state.queues.insert(context_id, VecDeque::new());
        drop(state);

        MemoryDocumentStorage {
            hub: self.clone(),
            context_id,
        }
    }

    /// Current raw value for `key`, bypassing any context.
    pub fn raw_value(&self, key: &str) -> Option<String> {
        self.lock().ok()?.values.get(key).cloned()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HubState>> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

/// One context's view of a [`MemoryStorageHub`].
pub struct MemoryDocumentStorage {
    hub: MemoryStorageHub,
    context_id: u64,
}

impl DocumentStorage for MemoryDocumentStorage {
    fn read(&mut self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.hub.lock()?.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let mut state = self.hub.lock()?;

        if let Some(limit_bytes) = state.quota_bytes {
            let required_bytes = state.used_bytes_with(key, value);
            if required_bytes > limit_bytes {
                return Err(StorageError::QuotaExceeded {
                    limit_bytes,
                    required_bytes,
                });
            }
        }

        let context_id = self.context_id;
        state.values.insert(key.to_string(), value.to_string());
        state.last_writer.insert(key.to_string(), context_id);
        for (_, queue) in state
            .queues
            .iter_mut()
            .filter(|(id, _)| **id != context_id)
        {
            queue.push_back(key.to_string());
        }
        Ok(())
    }

    fn poll_external_changes(&mut self) -> StorageResult<Vec<ExternalChange>> {
        let mut state = self.hub.lock()?;
        let dirty: Vec<String> = match state.queues.get_mut(&self.context_id) {
            Some(queue) => queue.drain(..).collect(),
            None => return Ok(Vec::new()),
        };

        let mut changes = Vec::new();
        for (position, key) in dirty.iter().enumerate() {
            // Report each key once, at its last position.
            if dirty[position + 1..].contains(key) {
                continue;
            }
            if state.last_writer.get(key) == Some(&self.context_id) {
                continue;
            }
            if let Some(value) = state.values.get(key) {
                changes.push(ExternalChange {
                    key: key.clone(),
                    new_value: value.clone(),
                });
            }
        }
        Ok(changes)
    }
}

impl Drop for MemoryDocumentStorage {
    fn drop(&mut self) {
        if let Ok(mut state) = self.hub.state.lock() {
            state.queues.remove(&self.context_id);
        }
    }
}
