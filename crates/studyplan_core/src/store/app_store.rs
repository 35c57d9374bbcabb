//! In-memory source of truth for the schedule, extra classes and notes.
//!
//! # Responsibility
//! - Own the three collections and apply every mutation to them.
//! - Load each document once at startup, seeding defaults when absent.
//! - Write the whole owning document after each effective mutation.
//! - Replace a document when another instance writes it.
//!
//! # Invariants
//! - A document is never written before it reaches `DocumentState::Ready`.
//! - Mutations with unknown ids or out-of-range positions are no-ops.
//! - Notes are newest-first; extra classes keep insertion order.
//! - `reset_schedule` never touches notes.
//! - External changes are applied as whole-document replacements and are not
//!   written back.

use crate::model::calendar::{Session, PERIODS_PER_SESSION};
use crate::model::extra_class::{ExtraClass, ExtraClassPatch};
use crate::model::note::Note;
use crate::model::schedule::{default_schedule, validate_schedule, DaySchedule, PeriodPatch};
use crate::storage::{DocumentKey, DocumentStorage, PersistenceAdapter};
use log::{debug, info, warn};
use std::sync::mpsc::{channel, Receiver};

/// Per-document load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Uninitialized,
    Loading,
    Ready,
}

/// Snapshot of the three collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub schedule: Vec<DaySchedule>,
    pub extra_classes: Vec<ExtraClass>,
    pub notes: Vec<Note>,
}

/// What triggered a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// Initial load (or default seeding) finished.
    Load,
    /// A mutation made through this store.
    Local,
    /// A value written by another instance.
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    pub document: DocumentKey,
    pub origin: ChangeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Change listener. Receives the change and the state after it.
pub type StoreListener = Box<dyn FnMut(&StoreChange, &AppState) + Send>;

pub struct AppStore<S: DocumentStorage> {
    persistence: PersistenceAdapter<S>,
    state: AppState,
    readiness: [DocumentState; 3],
    listeners: Vec<(SubscriptionId, StoreListener)>,
    next_subscription: u64,
    inbox: Receiver<(DocumentKey, String)>,
}

impl<S: DocumentStorage> AppStore<S> {
    /// Creates an unloaded store over `storage`.
    ///
    /// Collections stay empty and every document `Uninitialized` until
    /// [`AppStore::load`] runs.
    pub fn new(storage: S) -> Self {
        let mut persistence = PersistenceAdapter::new(storage);
        let (sender, inbox) = channel();
        for key in DocumentKey::ALL {
            let sender = sender.clone();
            persistence.subscribe_external_change(
                key,
                Box::new(move |raw| {
                    // Receiver lives as long as the store; a send error only
                    // happens during teardown.
                    let _ = sender.send((key, raw.to_string()));
                }),
            );
        }

        Self {
            persistence,
            state: AppState::default(),
            readiness: [DocumentState::Uninitialized; 3],
            listeners: Vec::new(),
            next_subscription: 0,
            inbox,
        }
    }

    /// Creates a store and loads every document.
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Loads every document that has not started loading yet.
    pub fn load(&mut self) {
        for key in DocumentKey::ALL {
            self.load_document(key);
        }
    }

    pub fn document_state(&self, key: DocumentKey) -> DocumentState {
        self.readiness[key.index()]
    }

    /// Whether all three documents finished loading.
    pub fn is_ready(&self) -> bool {
        self.readiness
            .iter()
            .all(|state| *state == DocumentState::Ready)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn schedule(&self) -> &[DaySchedule] {
        &self.state.schedule
    }

    pub fn extra_classes(&self) -> &[ExtraClass] {
        &self.state.extra_classes
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn subscribe(&mut self, listener: StoreListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` for unknown ids.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Merges `patch` into one period of the weekly grid.
    ///
    /// Unknown `day_id` or `index >= PERIODS_PER_SESSION` is a silent no-op.
    /// Returns whether the period changed.
    pub fn update_period(
        &mut self,
        day_id: &str,
        session: Session,
        index: usize,
        patch: &PeriodPatch,
    ) -> bool {
        if index >= PERIODS_PER_SESSION {
            debug!(
                "event=update_period module=store status=ignored reason=index_out_of_range index={index}"
            );
            return false;
        }
        let Some(day) = self.state.schedule.iter_mut().find(|day| day.id == day_id) else {
            debug!(
                "event=update_period module=store status=ignored reason=unknown_day day_id={day_id}"
            );
            return false;
        };
        let Some(period) = day.session_mut(session).get_mut(index) else {
            return false;
        };

        if !patch.apply_to(period) {
            return false;
        }
        self.commit_local(DocumentKey::Schedule);
        true
    }

    /// Appends an extra class. Ids are the caller's responsibility.
    pub fn add_extra_class(&mut self, entry: ExtraClass) {
        self.state.extra_classes.push(entry);
        self.commit_local(DocumentKey::ExtraClasses);
    }

    /// Merges `patch` into the extra class with `id`. No-op when absent.
    pub fn update_extra_class(&mut self, id: &str, patch: &ExtraClassPatch) -> bool {
        let Some(entry) = self
            .state
            .extra_classes
            .iter_mut()
            .find(|entry| entry.id == id)
        else {
            return false;
        };

        if !patch.apply_to(entry) {
            return false;
        }
        self.commit_local(DocumentKey::ExtraClasses);
        true
    }

    /// Removes the extra class with `id`. No-op when absent.
    pub fn delete_extra_class(&mut self, id: &str) -> bool {
        let before = self.state.extra_classes.len();
        self.state.extra_classes.retain(|entry| entry.id != id);
        if self.state.extra_classes.len() == before {
            return false;
        }
        self.commit_local(DocumentKey::ExtraClasses);
        true
    }

    /// Inserts a note at the front (newest first).
    pub fn add_note(&mut self, note: Note) {
        self.state.notes.insert(0, note);
        self.commit_local(DocumentKey::Notes);
    }

    /// Replaces the content of the note with `id`. No-op when absent.
    pub fn update_note(&mut self, id: &str, content: impl Into<String>) -> bool {
        let Some(note) = self.state.notes.iter_mut().find(|note| note.id == id) else {
            return false;
        };

        let content = content.into();
        if note.content == content {
            return false;
        }
        note.content = content;
        self.commit_local(DocumentKey::Notes);
        true
    }

    /// Removes the note with `id`. No-op when absent.
    pub fn delete_note(&mut self, id: &str) -> bool {
        let before = self.state.notes.len();
        self.state.notes.retain(|note| note.id != id);
        if self.state.notes.len() == before {
            return false;
        }
        self.commit_local(DocumentKey::Notes);
        true
    }

    /// Starts a new week: fresh default schedule, no extra classes.
    ///
    /// Notes are kept. Destructive; asking the user first is up to the caller.
    pub fn reset_schedule(&mut self) {
        info!(
            "event=reset_schedule module=store status=start extra_classes={}",
            self.state.extra_classes.len()
        );
        self.state.schedule = default_schedule();
        self.state.extra_classes.clear();
        self.commit_local(DocumentKey::Schedule);
        self.commit_local(DocumentKey::ExtraClasses);
    }

    /// Applies values other instances wrote since the last call.
    ///
    /// Returns the number of documents replaced.
    pub fn sync_external_changes(&mut self) -> usize {
        self.persistence.dispatch_external_changes();

        let mut applied = 0;
        while let Ok((key, raw)) = self.inbox.try_recv() {
            if self.apply_external(key, &raw) {
                applied += 1;
            }
        }
        applied
    }

    fn load_document(&mut self, key: DocumentKey) {
        if self.readiness[key.index()] != DocumentState::Uninitialized {
            return;
        }
        self.readiness[key.index()] = DocumentState::Loading;

        let restored = match key {
            DocumentKey::Schedule => match self.persistence.load::<Vec<DaySchedule>>(key) {
                Some(days) => {
                    let shape = validate_schedule(&days);
                    match shape {
                        Ok(()) => {
                            self.state.schedule = days;
                            true
                        }
                        Err(err) => {
                            warn!(
                                "event=document_load module=store status=invalid_shape key={} error={}",
                                key, err
                            );
                            self.state.schedule = default_schedule();
                            false
                        }
                    }
                }
                None => {
                    self.state.schedule = default_schedule();
                    false
                }
            },
            DocumentKey::ExtraClasses => match self.persistence.load::<Vec<ExtraClass>>(key) {
                Some(classes) => {
                    self.state.extra_classes = classes;
                    true
                }
                None => {
                    self.state.extra_classes = Vec::new();
                    false
                }
            },
            DocumentKey::Notes => match self.persistence.load::<Vec<Note>>(key) {
                Some(notes) => {
                    self.state.notes = notes;
                    true
                }
                None => {
                    self.state.notes = Vec::new();
                    false
                }
            },
        };

        self.readiness[key.index()] = DocumentState::Ready;
        if restored {
            info!("event=document_load module=store status=ok key={key}");
        } else {
            info!("event=document_load module=store status=fallback key={key}");
            self.persist(key);
        }
        self.notify(key, ChangeOrigin::Load);
    }

    fn apply_external(&mut self, key: DocumentKey, raw: &str) -> bool {
        if self.readiness[key.index()] != DocumentState::Ready {
            debug!("event=external_change module=store status=ignored reason=not_ready key={key}");
            return false;
        }

        let decoded = match key {
            DocumentKey::Schedule => serde_json::from_str::<Vec<DaySchedule>>(raw)
                .map_err(|err| err.to_string())
                .and_then(|days| {
                    validate_schedule(&days)
                        .map(|()| days)
                        .map_err(|err| err.to_string())
                })
                .map(|days| self.state.schedule = days),
            DocumentKey::ExtraClasses => serde_json::from_str::<Vec<ExtraClass>>(raw)
                .map(|classes| self.state.extra_classes = classes)
                .map_err(|err| err.to_string()),
            DocumentKey::Notes => serde_json::from_str::<Vec<Note>>(raw)
                .map(|notes| self.state.notes = notes)
                .map_err(|err| err.to_string()),
        };

        match decoded {
            Ok(()) => {
                info!("event=external_change module=store status=ok key={key}");
                self.notify(key, ChangeOrigin::External);
                true
            }
            Err(err) => {
                warn!(
                    "event=external_change module=store status=malformed key={key} error={err}"
                );
                false
            }
        }
    }

    fn commit_local(&mut self, key: DocumentKey) {
        self.persist(key);
        self.notify(key, ChangeOrigin::Local);
    }

    fn persist(&mut self, key: DocumentKey) -> bool {
        if self.readiness[key.index()] != DocumentState::Ready {
            debug!("event=document_save module=store status=skipped reason=not_ready key={key}");
            return false;
        }
        match key {
            DocumentKey::Schedule => self.persistence.save(key, &self.state.schedule),
            DocumentKey::ExtraClasses => self.persistence.save(key, &self.state.extra_classes),
            DocumentKey::Notes => self.persistence.save(key, &self.state.notes),
        }
    }

    fn notify(&mut self, document: DocumentKey, origin: ChangeOrigin) {
        let change = StoreChange { document, origin };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change, &self.state);
        }
    }
}
