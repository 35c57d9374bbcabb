use studyplan_core::{
    AppStore, ChangeOrigin, DocumentKey, DocumentStorage, ExtraClass, MemoryStorageHub, Note,
    PeriodPatch, Session, SqliteDocumentStorage,
};
use std::sync::{Arc, Mutex};

fn note(id: &str, content: &str) -> Note {
    Note {
        id: id.to_string(),
        content: content.to_string(),
        created_at: 1_700_000_000_000,
        color: "bg-cyan-100 text-cyan-900".to_string(),
    }
}

#[test]
fn external_notes_write_replaces_local_notes() {
    let hub = MemoryStorageHub::new();
    let mut store = AppStore::open(hub.connect());
    store.add_note(note("local", "will be overwritten"));

    let incoming = vec![note("a", "from another window"), note("b", "second")];
    let mut other_window = hub.connect();
    other_window
        .write("app_notes_v1", &serde_json::to_string(&incoming).unwrap())
        .unwrap();

    assert_eq!(store.sync_external_changes(), 1);
    assert_eq!(store.notes(), incoming.as_slice());
}

#[test]
fn external_changes_notify_listeners_and_are_not_written_back() {
    let hub = MemoryStorageHub::new();
    let mut first = AppStore::open(hub.connect());
    let mut second = AppStore::open(hub.connect());
    first.sync_external_changes();
    second.sync_external_changes();

    let origins = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&origins);
    second.subscribe(Box::new(move |change, _| {
        sink.lock().unwrap().push((change.document, change.origin));
    }));

    first.add_extra_class(ExtraClass::with_id("e1", "thu", "20:00", "Coding"));
    assert_eq!(second.sync_external_changes(), 1);
    assert_eq!(second.extra_classes()[0].subject, "Coding");
    assert_eq!(
        *origins.lock().unwrap(),
        vec![(DocumentKey::ExtraClasses, ChangeOrigin::External)]
    );

    // Applying the external value must not bounce back to the writer.
    assert_eq!(first.sync_external_changes(), 0);
}

#[test]
fn documents_are_replaced_independently_and_last_write_wins() {
    let hub = MemoryStorageHub::new();
    let mut first = AppStore::open(hub.connect());
    let mut second = AppStore::open(hub.connect());
    first.sync_external_changes();
    second.sync_external_changes();

    first.update_period("mon", Session::Morning, 0, &PeriodPatch::subject("Literature"));
    second.add_note(note("n2", "written by second"));
    second.update_period("tue", Session::Morning, 0, &PeriodPatch::subject("Geography"));

    first.sync_external_changes();
    second.sync_external_changes();

    // The later schedule write (from `second`) wins as a whole document.
    assert_eq!(first.schedule()[0].morning[0].subject, "");
    assert_eq!(first.schedule()[1].morning[0].subject, "Geography");
    assert_eq!(first.notes()[0].id, "n2");
    assert_eq!(second.schedule()[1].morning[0].subject, "Geography");
}

#[test]
fn malformed_external_value_is_ignored() {
    let hub = MemoryStorageHub::new();
    let mut store = AppStore::open(hub.connect());
    store.add_note(note("n1", "keep"));

    hub.connect().write("app_notes_v1", "not json").unwrap();
    hub.connect().write("app_schedule_v1", "[]").unwrap();

    assert_eq!(store.sync_external_changes(), 0);
    assert_eq!(store.notes()[0].content, "keep");
    assert_eq!(store.schedule().len(), 7);
}

#[test]
fn sqlite_connections_on_one_file_see_each_others_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studyplan.db");

    let mut first = AppStore::open(SqliteDocumentStorage::open(&path).unwrap());
    let mut second = AppStore::open(SqliteDocumentStorage::open(&path).unwrap());
    first.sync_external_changes();
    second.sync_external_changes();

    second.add_note(note("n1", "from second"));
    second.update_period("sat", Session::Afternoon, 3, &PeriodPatch::subject("Football"));

    assert_eq!(second.sync_external_changes(), 0);
    assert_eq!(first.sync_external_changes(), 2);
    assert_eq!(first.notes()[0].content, "from second");
    assert_eq!(first.schedule()[5].afternoon[3].subject, "Football");

    assert_eq!(first.sync_external_changes(), 0);
}

#[test]
fn sqlite_poll_reports_changes_in_write_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order.db");

    let mut writer = SqliteDocumentStorage::open(&path).unwrap();
    let mut reader = SqliteDocumentStorage::open(&path).unwrap();

    writer.write("app_schedule_v1", "[1]").unwrap();
    writer.write("app_extra_v1", "[2]").unwrap();
    writer.write("app_notes_v1", "[3]").unwrap();
    writer.write("app_schedule_v1", "[4]").unwrap();

    let changes = reader.poll_external_changes().unwrap();
    let keys: Vec<&str> = changes.iter().map(|change| change.key.as_str()).collect();
    assert_eq!(keys, ["app_extra_v1", "app_notes_v1", "app_schedule_v1"]);
    assert_eq!(changes[2].new_value, "[4]");
}

#[test]
fn sqlite_poll_reports_each_external_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("poll.db");

    let mut writer = SqliteDocumentStorage::open(&path).unwrap();
    let mut reader = SqliteDocumentStorage::open(&path).unwrap();

    writer.write("app_notes_v1", "[]").unwrap();
    let changes = reader.poll_external_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, "app_notes_v1");
    assert_eq!(changes[0].new_value, "[]");

    assert!(reader.poll_external_changes().unwrap().is_empty());
    assert!(writer.poll_external_changes().unwrap().is_empty());

    // Rewriting the same bytes is not a change.
    writer.write("app_notes_v1", "[]").unwrap();
    assert!(reader.poll_external_changes().unwrap().is_empty());
}
