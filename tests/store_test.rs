use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use workout_log_lib::{
    HistoryEntry, JsonFileStore, LocalRecord, MemoryStore, NewRecord, RecordId, SqliteStore,
    StoreError, WorkoutRecord, WorkoutStore, WorkoutType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ids(records: &[WorkoutRecord]) -> Vec<RecordId> {
    records.iter().map(|r| r.record_id().clone()).collect()
}

#[test]
fn test_new_record_parse() -> Result<()> {
    let new = NewRecord::parse("chest day", "2024-01-05")?;
    assert_eq!(new.workout_type, "Chest Day");
    assert_eq!(new.date_string(), "2024-01-05");

    let new = NewRecord::parse(" Leg Day Quads ", " 2024-02-29 ")?;
    assert_eq!(new.workout_type, "Leg Day Quads");

    assert!(matches!(
        NewRecord::parse("Yoga", "2024-01-05"),
        Err(StoreError::UnknownWorkoutType(t)) if t == "Yoga"
    ));
    assert!(matches!(
        NewRecord::parse("Back Day", "2024-13-01"),
        Err(StoreError::InvalidDate(_))
    ));

    // Routine names are free text
    let routine = NewRecord::for_routine("Arms & Abs", date(2024, 3, 1));
    assert_eq!(routine.workout_type, "Arms & Abs");
    Ok(())
}

#[test]
fn test_record_id_from_input() {
    assert_eq!(RecordId::from("42"), RecordId::Int(42));
    assert_eq!(RecordId::from(" 7 "), RecordId::Int(7));
    assert_eq!(RecordId::from("a1b2"), RecordId::Text("a1b2".to_string()));
    assert_eq!(RecordId::from(3), RecordId::Int(3));
}

#[test]
fn test_record_json_shapes() -> Result<()> {
    let owned: WorkoutRecord = serde_json::from_str(
        r#"{"id": "x9", "type": "Back Day", "date": "2024-02-12", "user_id": "u1"}"#,
    )?;
    assert_eq!(owned.user_id(), Some("u1"));
    assert_eq!(owned.record_id(), &RecordId::Text("x9".to_string()));

    let local: WorkoutRecord =
        serde_json::from_str(r#"{"id": 3, "type": "Chest Day", "date": "2024-01-05"}"#)?;
    assert_eq!(local.user_id(), None);
    assert_eq!(local.record_id(), &RecordId::Int(3));
    assert_eq!(local.workout_type(), "Chest Day");
    Ok(())
}

#[test]
fn test_memory_store_create_and_delete() -> Result<()> {
    let mut store = MemoryStore::new();
    assert!(store.list()?.is_empty());

    let first = store.create(NewRecord::new(WorkoutType::ChestDay, date(2024, 1, 5)))?;
    let second = store.create(NewRecord::new(WorkoutType::BackDay, date(2024, 1, 8)))?;
    assert_eq!(first.record_id(), &RecordId::Int(1));
    assert_eq!(second.record_id(), &RecordId::Int(2));
    assert_eq!(second.date(), "2024-01-08");

    store.delete(&RecordId::Int(1))?;
    assert_eq!(ids(&store.list()?), vec![RecordId::Int(2)]);

    match store.delete(&RecordId::Int(1)) {
        Err(StoreError::RecordNotFound(id)) => assert_eq!(id, RecordId::Int(1)),
        other => panic!("expected RecordNotFound, got {other:?}"),
    }

    // Deleting the newest record does not free its id
    store.delete(&RecordId::Int(2))?;
    let third = store.create(NewRecord::new(WorkoutType::BackDay, date(2024, 1, 9)))?;
    assert_eq!(third.record_id(), &RecordId::Int(3));
    Ok(())
}

#[test]
fn test_memory_store_ids_follow_existing_records() -> Result<()> {
    let mut store = MemoryStore::with_records(vec![
        LocalRecord {
            id: RecordId::Text("imported".to_string()),
            workout_type: "Yoga".to_string(),
            date: "2023-05-01".to_string(),
        },
        LocalRecord {
            id: RecordId::Int(5),
            workout_type: "Chest Day".to_string(),
            date: "2023-05-02".to_string(),
        },
    ]);
    let created = store.create(NewRecord::new(WorkoutType::ShouldersDay, date(2023, 5, 3)))?;
    assert_eq!(created.record_id(), &RecordId::Int(6));

    store.delete(&RecordId::Text("imported".to_string()))?;
    assert_eq!(ids(&store.list()?), vec![RecordId::Int(5), RecordId::Int(6)]);
    Ok(())
}

#[test]
fn test_json_store_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("history.json");

    let mut store = JsonFileStore::open(&path)?;
    assert!(store.list()?.is_empty());
    assert!(!path.exists());

    store.create(NewRecord::new(WorkoutType::ChestDay, date(2024, 1, 5)))?;
    store.create(NewRecord::new(WorkoutType::LegDayQuads, date(2024, 1, 8)))?;
    store.create(NewRecord::new(WorkoutType::BackDay, date(2024, 2, 12)))?;
    assert!(path.exists());

    let mut reopened = JsonFileStore::open(&path)?;
    let records = reopened.list()?;
    assert_eq!(records, store.list()?);
    assert_eq!(records[1].workout_type(), "Leg Day Quads");

    reopened.delete(&RecordId::Int(2))?;
    let again = JsonFileStore::open(&path)?;
    assert_eq!(ids(&again.list()?), vec![RecordId::Int(1), RecordId::Int(3)]);
    Ok(())
}

#[test]
fn test_json_store_never_reuses_ids() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");

    let mut store = JsonFileStore::open(&path)?;
    store.create(NewRecord::new(WorkoutType::ChestDay, date(2024, 1, 5)))?;
    let newest = store.create(NewRecord::new(WorkoutType::BackDay, date(2024, 1, 6)))?;
    store.delete(newest.record_id())?;

    // Also across a reopen
    let mut reopened = JsonFileStore::open(&path)?;
    let created = reopened.create(NewRecord::new(WorkoutType::LegDayGlutes, date(2024, 1, 7)))?;
    assert_eq!(created.record_id(), &RecordId::Int(3));

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(saved["next_id"], 4);
    Ok(())
}

#[test]
fn test_json_store_file_format() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");
    fs::write(
        &path,
        r#"{"workouts": [{"id": "abc", "type": "Yoga", "date": "2024-01-05"}]}"#,
    )?;

    let mut store = JsonFileStore::open(&path)?;
    assert_eq!(store.list()?[0].record_id(), &RecordId::Text("abc".to_string()));

    let created = store.create(NewRecord::new(WorkoutType::BackDay, date(2024, 1, 6)))?;
    assert_eq!(created.record_id(), &RecordId::Int(1));

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(saved["workouts"][1]["type"], "Back Day");
    assert_eq!(saved["workouts"][1]["date"], "2024-01-06");
    assert_eq!(saved["workouts"][1]["id"], 1);

    store.delete(&RecordId::Text("abc".to_string()))?;
    assert_eq!(ids(&JsonFileStore::open(&path)?.list()?), vec![RecordId::Int(1)]);
    Ok(())
}

#[test]
fn test_json_store_empty_and_corrupt_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("history.json");

    fs::write(&path, "  \n")?;
    assert!(JsonFileStore::open(&path)?.list()?.is_empty());

    fs::write(&path, "{ not json")?;
    assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    Ok(())
}

#[test]
fn test_sqlite_store_is_scoped_by_user() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("workouts.sqlite");

    let mut alice = SqliteStore::open(&db_path, "alice")?;
    let mut bob = SqliteStore::open(&db_path, "bob")?;
    assert_eq!(alice.user_id(), "alice");

    let created = alice.create(NewRecord::new(WorkoutType::ChestDay, date(2024, 1, 5)))?;
    assert_eq!(created.user_id(), Some("alice"));
    bob.create(NewRecord::new(WorkoutType::BackDay, date(2024, 1, 6)))?;

    let alice_records = alice.list()?;
    assert_eq!(alice_records.len(), 1);
    assert_eq!(alice_records[0].workout_type(), "Chest Day");
    assert_eq!(bob.list()?.len(), 1);

    // Bob cannot delete Alice's record
    assert!(matches!(
        bob.delete(created.record_id()),
        Err(StoreError::RecordNotFound(_))
    ));
    assert_eq!(alice.list()?.len(), 1);

    alice.delete(created.record_id())?;
    assert!(alice.list()?.is_empty());
    assert_eq!(bob.list()?.len(), 1);
    Ok(())
}

#[test]
fn test_sqlite_store_rejects_text_ids() -> Result<()> {
    let conn = rusqlite::Connection::open_in_memory()?;
    let mut store = SqliteStore::new(conn, "user-1")?;
    store.create(NewRecord::new(WorkoutType::ChestDay, date(2024, 1, 5)))?;

    assert!(matches!(
        store.delete(&RecordId::Text("1".to_string())),
        Err(StoreError::RecordNotFound(_))
    ));
    assert!(matches!(
        store.delete(&RecordId::Int(99)),
        Err(StoreError::RecordNotFound(_))
    ));
    assert_eq!(store.list()?.len(), 1);
    Ok(())
}
