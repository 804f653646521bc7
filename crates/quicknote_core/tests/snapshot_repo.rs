use chrono::{TimeZone, Utc};
use quicknote_core::{
    KeyValueStore, KvSnapshotRepository, MemoryKeyValueStore, Note, NoteId,
    NoteSnapshotRepository, NoteStore, RepoError, SnapshotReadError, SqliteKeyValueStore,
    NOTES_STORAGE_KEY,
};

fn sample_notes() -> Vec<Note> {
    let created = Utc.with_ymd_and_hms(2026, 10, 1, 8, 30, 0).unwrap()
        + chrono::Duration::milliseconds(125);
    let mut first = Note::new(NoteId::new("1700000000001").unwrap(), created);
    first.title = "Groceries".to_string();
    first.content = "- milk\n- \u{1f95a} eggs".to_string();
    first.updated_at = created + chrono::Duration::milliseconds(4_321);

    let second = Note::new(
        NoteId::new("6f1c1d2e-93a4-4a55-9d3e-0c1b2a394857").unwrap(),
        created - chrono::Duration::days(2),
    );
    vec![first, second]
}

#[test]
fn save_then_load_round_trips_every_field_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quicknote.sqlite3");
    let notes = sample_notes();

    {
        let mut repo = KvSnapshotRepository::new(SqliteKeyValueStore::open(&path).unwrap());
        repo.save(&notes).unwrap();
    }

    let repo = KvSnapshotRepository::new(SqliteKeyValueStore::open(&path).unwrap());
    assert_eq!(repo.load(), notes);
}

#[test]
fn snapshot_uses_camel_case_iso_timestamps() {
    let kv = MemoryKeyValueStore::new();
    let mut repo = KvSnapshotRepository::new(kv.clone());
    repo.save(&sample_notes()).unwrap();

    let raw = kv.raw(NOTES_STORAGE_KEY).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &json[0];
    assert_eq!(first["id"], "1700000000001");
    assert_eq!(first["title"], "Groceries");
    assert_eq!(first["createdAt"], "2026-10-01T08:30:00.125Z");
    assert_eq!(first["updatedAt"], "2026-10-01T08:30:04.446Z");
    assert!(json.as_array().unwrap().len() == 2);

    let whole_second = Utc.with_ymd_and_hms(2026, 10, 18, 9, 32, 0).unwrap();
    repo.save(&[Note::new(NoteId::new("a").unwrap(), whole_second)])
        .unwrap();
    let raw = kv.raw(NOTES_STORAGE_KEY).unwrap();
    assert!(raw.contains(r#""createdAt":"2026-10-18T09:32:00.000Z""#), "{raw}");
    assert!(raw.contains(r#""updatedAt":"2026-10-18T09:32:00.000Z""#), "{raw}");
}

#[test]
fn missing_key_loads_empty_without_error() {
    let repo = KvSnapshotRepository::new(MemoryKeyValueStore::new());
    assert!(repo.try_load().unwrap().is_empty());
    assert!(repo.load().is_empty());
}

#[test]
fn corrupt_snapshot_loads_empty_and_store_starts_clean() {
    let mut kv = MemoryKeyValueStore::new();
    kv.set(NOTES_STORAGE_KEY, "{not json").unwrap();

    let repo = KvSnapshotRepository::new(kv.clone());
    assert!(matches!(repo.try_load(), Err(SnapshotReadError::Decode(_))));

    let store = NoteStore::open(repo);
    assert!(store.is_empty());
    assert_eq!(store.selected_id(), None);
}

#[test]
fn storage_read_failure_loads_empty_and_store_has_no_selection() {
    let kv = MemoryKeyValueStore::new();
    let mut repo = KvSnapshotRepository::new(kv.clone());
    repo.save(&sample_notes()).unwrap();
    kv.set_fail_reads(true);

    assert!(matches!(repo.try_load(), Err(SnapshotReadError::Storage(_))));
    assert!(repo.load().is_empty());

    let store = NoteStore::open(repo);
    assert!(store.is_empty());
    assert_eq!(store.selected_id(), None);

    kv.set_fail_reads(false);
    let recovered = KvSnapshotRepository::new(kv);
    assert_eq!(recovered.load(), sample_notes());
}

#[test]
fn snapshot_with_invalid_record_is_treated_as_corrupt() {
    let mut kv = MemoryKeyValueStore::new();
    kv.set(
        NOTES_STORAGE_KEY,
        r#"[{"id":"","title":"","content":"","createdAt":"2026-01-01T00:00:00.000Z","updatedAt":"2026-01-01T00:00:00.000Z"}]"#,
    )
    .unwrap();

    let repo = KvSnapshotRepository::new(kv);
    let err = repo.try_load().unwrap_err();
    assert!(err.to_string().contains("note id must not be empty"), "{err}");
    assert!(repo.load().is_empty());
}

#[test]
fn custom_key_isolates_snapshots() {
    let kv = MemoryKeyValueStore::new();
    let mut work = KvSnapshotRepository::with_key(kv.clone(), "notes:work");
    work.save(&sample_notes()).unwrap();

    let default_slot = KvSnapshotRepository::new(kv.clone());
    assert!(default_slot.load().is_empty());
    assert_eq!(work.key(), "notes:work");
    assert_eq!(work.load().len(), 2);
}

#[test]
fn save_failure_is_returned_not_swallowed() {
    let kv = MemoryKeyValueStore::new();
    let mut repo = KvSnapshotRepository::new(kv.clone());
    kv.set_fail_writes(true);

    let err = repo.save(&sample_notes()).unwrap_err();
    assert!(matches!(err, RepoError::Unavailable(_)));
    assert_eq!(kv.raw(NOTES_STORAGE_KEY), None);
}

#[test]
fn sqlite_quota_rejects_oversized_snapshot() {
    let store = SqliteKeyValueStore::open_in_memory()
        .unwrap()
        .with_quota(Some(64));
    let mut repo = KvSnapshotRepository::new(store);

    let err = repo.save(&sample_notes()).unwrap_err();
    assert!(matches!(err, RepoError::QuotaExceeded { quota_bytes: 64, .. }));
    assert!(repo.load().is_empty());
}
