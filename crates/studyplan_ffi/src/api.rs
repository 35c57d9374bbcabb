//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the store's reads and mutations to Dart via FRB.
//! - Validate raw form input before it reaches the store.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One process-wide store, opened lazily on first use and guarded by a
//!   mutex.
//! - Collections cross the boundary as the same JSON stored on disk.

use log::warn;
use studyplan_core::config::resolve_db_path;
use studyplan_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, AppStore, ExtraClass,
    ExtraClassPatch, ExtraClassValidationError, Note, PeriodPatch, Session,
    SqliteDocumentStorage, DEFAULT_NOTE_COLOR,
};
use std::sync::Mutex;

type Store = AppStore<SqliteDocumentStorage>;

static STORE: Mutex<Option<Store>> = Mutex::new(None);

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Full store state, collections encoded as JSON arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshotResponse {
    /// Whether the store could be opened and encoded.
    pub ok: bool,
    /// Whether all three documents finished loading.
    pub is_ready: bool,
    pub schedule_json: String,
    pub extra_classes_json: String,
    pub notes_json: String,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreActionResponse {
    /// Whether the call was accepted.
    pub ok: bool,
    /// Whether state changed (`false` for no-ops such as unknown ids).
    pub changed: bool,
    /// Id of the created entry, for add operations.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl StoreActionResponse {
    fn applied(changed: bool, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed,
            id: None,
            message: message.into(),
        }
    }

    fn created(id: String, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Reads the current store state.
///
/// # FFI contract
/// - Sync call, opens the store DB on first use.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn store_snapshot() -> StoreSnapshotResponse {
    let encoded = with_store(|store| -> Result<_, serde_json::Error> {
        let state = store.state();
        let schedule = serde_json::to_string(&state.schedule)?;
        let extra_classes = serde_json::to_string(&state.extra_classes)?;
        let notes = serde_json::to_string(&state.notes)?;
        Ok((store.is_ready(), schedule, extra_classes, notes))
    });

    match encoded {
        Ok(Ok((is_ready, schedule_json, extra_classes_json, notes_json))) => {
            StoreSnapshotResponse {
                ok: true,
                is_ready,
                schedule_json,
                extra_classes_json,
                notes_json,
                message: "Snapshot ready.".to_string(),
            }
        }
        Ok(Err(err)) => snapshot_failure(format!("store_snapshot encode failed: {err}")),
        Err(err) => snapshot_failure(format!("store_snapshot failed: {err}")),
    }
}

/// Edits one period of the weekly grid.
///
/// Input semantics:
/// - `session`: `morning|afternoon`.
/// - `index`: 0-based position in the session.
/// - `None` leaves a field untouched; an empty `room`/`note` clears it.
///
/// # FFI contract
/// - Unknown day or out-of-range index is accepted as a no-op (`changed=false`).
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_update_period(
    day_id: String,
    session: String,
    index: u32,
    subject: Option<String>,
    room: Option<String>,
    note: Option<String>,
) -> StoreActionResponse {
    let Some(session) = Session::parse(session.trim()) else {
        return StoreActionResponse::failure(format!(
            "schedule_update_period failed: unknown session `{}`",
            session.trim()
        ));
    };
    let patch = PeriodPatch {
        subject,
        room: room.map(blank_to_none),
        note: note.map(blank_to_none),
        ..PeriodPatch::default()
    };
    let index = usize::try_from(index).unwrap_or(usize::MAX);

    match with_store(|store| store.update_period(day_id.trim(), session, index, &patch)) {
        Ok(changed) => StoreActionResponse::applied(changed, change_message(changed, "Period")),
        Err(err) => StoreActionResponse::failure(format!("schedule_update_period failed: {err}")),
    }
}

/// Starts a new week: default schedule, extra classes cleared, notes kept.
///
/// # FFI contract
/// - Destructive; the UI confirms with the user before calling.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn schedule_reset() -> StoreActionResponse {
    match with_store(|store| store.reset_schedule()) {
        Ok(()) => StoreActionResponse::applied(true, "Schedule reset."),
        Err(err) => StoreActionResponse::failure(format!("schedule_reset failed: {err}")),
    }
}

/// Adds an extra class from form input.
///
/// # FFI contract
/// - Rejects unknown day ids, non `HH:MM` times and blank subjects.
/// - Returns the generated id on success.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn extra_class_add(
    day_id: String,
    time: String,
    subject: String,
    location: Option<String>,
    note: Option<String>,
) -> StoreActionResponse {
    let mut entry = ExtraClass::new(day_id.trim(), time.trim(), subject.trim());
    entry.location = location.and_then(blank_to_none);
    entry.note = note.and_then(blank_to_none);
    if let Err(err) = entry.validate() {
        return StoreActionResponse::failure(format!("extra_class_add rejected: {err}"));
    }

    let id = entry.id.clone();
    match with_store(|store| store.add_extra_class(entry)) {
        Ok(()) => StoreActionResponse::created(id, "Extra class added."),
        Err(err) => StoreActionResponse::failure(format!("extra_class_add failed: {err}")),
    }
}

/// Edits an extra class. `None` leaves a field untouched; an empty
/// `location`/`note` clears it.
///
/// # FFI contract
/// - The patched entry must still pass validation.
/// - Unknown id is accepted as a no-op (`changed=false`).
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn extra_class_update(
    id: String,
    day_id: Option<String>,
    time: Option<String>,
    subject: Option<String>,
    location: Option<String>,
    note: Option<String>,
) -> StoreActionResponse {
    let patch = ExtraClassPatch {
        day_id: day_id.map(|value| value.trim().to_string()),
        time: time.map(|value| value.trim().to_string()),
        subject: subject.map(|value| value.trim().to_string()),
        location: location.map(blank_to_none),
        note: note.map(blank_to_none),
    };

    let result = with_store(|store| -> Result<bool, ExtraClassValidationError> {
        let Some(current) = store.extra_classes().iter().find(|entry| entry.id == id) else {
            return Ok(false);
        };
        let mut candidate = current.clone();
        patch.apply_to(&mut candidate);
        candidate.validate()?;
        Ok(store.update_extra_class(&id, &patch))
    });

    match result {
        Ok(Ok(changed)) => {
            StoreActionResponse::applied(changed, change_message(changed, "Extra class"))
        }
        Ok(Err(err)) => StoreActionResponse::failure(format!("extra_class_update rejected: {err}")),
        Err(err) => StoreActionResponse::failure(format!("extra_class_update failed: {err}")),
    }
}

/// Deletes an extra class. Unknown id is a no-op (`changed=false`).
#[flutter_rust_bridge::frb(sync)]
pub fn extra_class_delete(id: String) -> StoreActionResponse {
    match with_store(|store| store.delete_extra_class(&id)) {
        Ok(changed) => StoreActionResponse::applied(changed, change_message(changed, "Extra class")),
        Err(err) => StoreActionResponse::failure(format!("extra_class_delete failed: {err}")),
    }
}

/// Adds a note at the top of the board.
///
/// # FFI contract
/// - Blank content is ignored (`ok=true`, `changed=false`).
/// - Missing or blank `color` uses the default note color.
/// - Returns the generated id on success.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add(content: String, color: Option<String>) -> StoreActionResponse {
    if content.trim().is_empty() {
        return StoreActionResponse::applied(false, "Empty note ignored.");
    }
    let color = color
        .and_then(blank_to_none)
        .unwrap_or_else(|| DEFAULT_NOTE_COLOR.to_string());
    let note = Note::new(content, color);

    let id = note.id.clone();
    match with_store(|store| store.add_note(note)) {
        Ok(()) => StoreActionResponse::created(id, "Note added."),
        Err(err) => StoreActionResponse::failure(format!("note_add failed: {err}")),
    }
}

/// Replaces a note's content. Unknown id is a no-op (`changed=false`).
#[flutter_rust_bridge::frb(sync)]
pub fn note_update(id: String, content: String) -> StoreActionResponse {
    match with_store(|store| store.update_note(&id, content)) {
        Ok(changed) => StoreActionResponse::applied(changed, change_message(changed, "Note")),
        Err(err) => StoreActionResponse::failure(format!("note_update failed: {err}")),
    }
}

/// Deletes a note. Unknown id is a no-op (`changed=false`).
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(id: String) -> StoreActionResponse {
    match with_store(|store| store.delete_note(&id)) {
        Ok(changed) => StoreActionResponse::applied(changed, change_message(changed, "Note")),
        Err(err) => StoreActionResponse::failure(format!("note_delete failed: {err}")),
    }
}

/// Pulls in documents written by other processes sharing the DB file.
///
/// # FFI contract
/// - Meant to be called on a timer or on app resume.
/// - `changed` reports whether any document was replaced.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn store_sync_external() -> StoreActionResponse {
    match with_store(|store| store.sync_external_changes()) {
        Ok(applied) => {
            StoreActionResponse::applied(applied > 0, format!("Applied {applied} document(s)."))
        }
        Err(err) => StoreActionResponse::failure(format!("store_sync_external failed: {err}")),
    }
}

fn with_store<T>(f: impl FnOnce(&mut Store) -> T) -> Result<T, String> {
    // A panic inside a previous call leaves the store itself consistent.
    let mut guard = STORE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if guard.is_none() {
        let db_path = resolve_db_path();
        let storage = SqliteDocumentStorage::open(&db_path).map_err(|err| {
            warn!(
                "event=store_open module=ffi status=error path={} error={}",
                db_path.display(),
                err
            );
            format!("store DB open failed: {err}")
        })?;
        *guard = Some(AppStore::open(storage));
    }

    match guard.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err("store unavailable".to_string()),
    }
}

fn snapshot_failure(message: String) -> StoreSnapshotResponse {
    StoreSnapshotResponse {
        ok: false,
        is_ready: false,
        schedule_json: "[]".to_string(),
        extra_classes_json: "[]".to_string(),
        notes_json: "[]".to_string(),
        message,
    }
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn change_message(changed: bool, what: &str) -> String {
    if changed {
        format!("{what} updated.")
    } else {
        "No change.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, extra_class_add, extra_class_delete, extra_class_update, init_logging,
        note_add, note_delete, note_update, schedule_update_period, store_snapshot,
        store_sync_external,
    };
    use serde_json::Value;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn snapshot_exposes_seven_days() {
        let snapshot = store_snapshot();
        assert!(snapshot.ok, "{}", snapshot.message);
        assert!(snapshot.is_ready);

        let schedule: Value = serde_json::from_str(&snapshot.schedule_json).unwrap();
        assert_eq!(schedule.as_array().unwrap().len(), 7);
        assert_eq!(schedule[0]["id"], "mon");
    }

    #[test]
    fn note_add_update_delete_round_trip() {
        let token = unique_token("note");
        let created = note_add(format!("remember {token}"), None);
        assert!(created.ok, "{}", created.message);
        let id = created.id.clone().expect("note add should return id");

        let notes = notes_json();
        let stored = notes
            .iter()
            .find(|note| note["id"] == id.as_str())
            .expect("created note in snapshot");
        assert_eq!(stored["color"], studyplan_core::DEFAULT_NOTE_COLOR);

        let updated = note_update(id.clone(), format!("changed {token}"));
        assert!(updated.changed);

        let deleted = note_delete(id.clone());
        assert!(deleted.changed);
        assert!(!notes_json().iter().any(|note| note["id"] == id.as_str()));
    }

    #[test]
    fn note_add_ignores_blank_content() {
        let response = note_add("   ".to_string(), Some("bg-red-100 text-red-900".to_string()));
        assert!(response.ok);
        assert!(!response.changed);
        assert!(response.id.is_none());
    }

    #[test]
    fn unknown_ids_are_accepted_as_no_ops() {
        let id = unique_token("missing");
        assert!(!note_update(id.clone(), "x".to_string()).changed);
        assert!(!note_delete(id.clone()).changed);
        let response = extra_class_delete(id);
        assert!(response.ok);
        assert!(!response.changed);
    }

    #[test]
    fn extra_class_add_rejects_invalid_input() {
        let bad_day = extra_class_add(
            "xyz".to_string(),
            "18:00".to_string(),
            "Math".to_string(),
            None,
            None,
        );
        assert!(!bad_day.ok);
        assert!(bad_day.message.contains("unknown day"));

        let bad_time = extra_class_add(
            "mon".to_string(),
            "6pm".to_string(),
            "Math".to_string(),
            None,
            None,
        );
        assert!(!bad_time.ok);
    }

    #[test]
    fn extra_class_update_validates_patched_entry() {
        let subject = unique_token("tutoring");
        let created = extra_class_add(
            "wed".to_string(),
            "18:00".to_string(),
            subject,
            Some("Center A".to_string()),
            None,
        );
        assert!(created.ok, "{}", created.message);
        let id = created.id.expect("extra class add should return id");

        let rejected = extra_class_update(
            id.clone(),
            None,
            Some("25:00".to_string()),
            None,
            None,
            None,
        );
        assert!(!rejected.ok);

        let cleared = extra_class_update(
            id.clone(),
            None,
            Some("19:30".to_string()),
            None,
            Some(String::new()),
            None,
        );
        assert!(cleared.changed, "{}", cleared.message);

        let snapshot = store_snapshot();
        let classes: Value = serde_json::from_str(&snapshot.extra_classes_json).unwrap();
        let stored = classes
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["id"] == id.as_str())
            .expect("updated class in snapshot");
        assert_eq!(stored["time"], "19:30");
        assert!(stored.get("location").is_none());

        assert!(extra_class_delete(id).changed);
    }

    #[test]
    fn schedule_update_period_validates_session() {
        let response = schedule_update_period(
            "mon".to_string(),
            "evening".to_string(),
            0,
            Some("Math".to_string()),
            None,
            None,
        );
        assert!(!response.ok);

        let out_of_range = schedule_update_period(
            "mon".to_string(),
            "morning".to_string(),
            5,
            Some("Math".to_string()),
            None,
            None,
        );
        assert!(out_of_range.ok);
        assert!(!out_of_range.changed);
    }

    #[test]
    fn schedule_update_period_writes_subject() {
        let subject = unique_token("Physics");
        let response = schedule_update_period(
            "fri".to_string(),
            "afternoon".to_string(),
            4,
            Some(subject.clone()),
            Some("B2".to_string()),
            None,
        );
        assert!(response.changed, "{}", response.message);

        let snapshot = store_snapshot();
        let schedule: Value = serde_json::from_str(&snapshot.schedule_json).unwrap();
        let period = &schedule[4]["afternoon"][4];
        assert_eq!(period["id"], "fri-afternoon-5");
        assert_eq!(period["subject"], subject.as_str());
        assert_eq!(period["room"], "B2");
    }

    #[test]
    fn sync_external_succeeds_without_other_writers() {
        let response = store_sync_external();
        assert!(response.ok, "{}", response.message);
    }

    fn notes_json() -> Vec<Value> {
        let snapshot = store_snapshot();
        assert!(snapshot.ok, "{}", snapshot.message);
        match serde_json::from_str::<Value>(&snapshot.notes_json).unwrap() {
            Value::Array(items) => items,
            other => panic!("notes snapshot is not an array: {other}"),
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
