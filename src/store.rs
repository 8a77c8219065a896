// src/store.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::DbError;
use crate::history::HistoryError;
use crate::record::{LocalRecord, NewRecord, RecordId, WorkoutRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Workout record not found: ID {0}")]
    RecordNotFound(RecordId),
    #[error("Unknown workout type: '{0}'")]
    UnknownWorkoutType(String),
    #[error(transparent)]
    InvalidDate(#[from] HistoryError),
    #[error("I/O error accessing history file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read or write history file (JSON): {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Where workout history records live. The history views only ever see the
/// output of [`WorkoutStore::list`].
pub trait WorkoutStore {
    /// All records, in the order they were created.
    fn list(&self) -> Result<Vec<WorkoutRecord>, StoreError>;
    fn create(&mut self, new: NewRecord) -> Result<WorkoutRecord, StoreError>;
    fn delete(&mut self, id: &RecordId) -> Result<(), StoreError>;
}

fn next_local_id(records: &[LocalRecord]) -> i64 {
    records
        .iter()
        .filter_map(|r| match r.id {
            RecordId::Int(id) => Some(id),
            RecordId::Text(_) => None,
        })
        .max()
        .map_or(1, |max| max + 1)
}

/// Records held in memory for the lifetime of the process.
/// Ids are never reused, even after the newest record is deleted.
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<LocalRecord>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<LocalRecord>) -> Self {
        let next_id = next_local_id(&records);
        Self { records, next_id }
    }
}

impl WorkoutStore for MemoryStore {
    fn list(&self) -> Result<Vec<WorkoutRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .cloned()
            .map(WorkoutRecord::Local)
            .collect())
    }

    fn create(&mut self, new: NewRecord) -> Result<WorkoutRecord, StoreError> {
        let record = LocalRecord {
            id: RecordId::Int(self.next_id),
            date: new.date_string(),
            workout_type: new.workout_type,
        };
        self.next_id += 1;
        debug!(id = %record.id, date = %record.date, "Created in-memory workout record");
        self.records.push(record.clone());
        Ok(WorkoutRecord::Local(record))
    }

    fn delete(&mut self, id: &RecordId) -> Result<(), StoreError> {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        if self.records.len() == before {
            return Err(StoreError::RecordNotFound(id.clone()));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct HistoryFile {
    /// Absent in files written before ids were tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_id: Option<i64>,
    #[serde(default)]
    workouts: Vec<LocalRecord>,
}

/// Records kept in a JSON file that is rewritten after every change.
/// The id counter is saved alongside, so ids are never reused.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<LocalRecord>,
    next_id: i64,
}

impl JsonFileStore {
    /// Opens the file at `path`. A missing file is an empty history.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                warn!(path = %path.display(), "History file is empty, starting with no records");
                HistoryFile::default()
            } else {
                serde_json::from_str::<HistoryFile>(&content)?
            }
        } else {
            HistoryFile::default()
        };
        // A hand-edited counter never goes below the ids already in use
        let next_id = next_local_id(&file.workouts).max(file.next_id.unwrap_or(1));
        Ok(Self {
            path,
            records: file.workouts,
            next_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent_dir) = self.path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let file = HistoryFile {
            next_id: Some(self.next_id),
            workouts: self.records.clone(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl WorkoutStore for JsonFileStore {
    fn list(&self) -> Result<Vec<WorkoutRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .cloned()
            .map(WorkoutRecord::Local)
            .collect())
    }

    fn create(&mut self, new: NewRecord) -> Result<WorkoutRecord, StoreError> {
        let record = LocalRecord {
            id: RecordId::Int(self.next_id),
            date: new.date_string(),
            workout_type: new.workout_type,
        };
        self.records.push(record.clone());
        self.next_id += 1;
        if let Err(e) = self.save() {
            self.records.pop();
            self.next_id -= 1;
            return Err(e);
        }
        debug!(id = %record.id, path = %self.path.display(), "Saved workout record to history file");
        Ok(WorkoutRecord::Local(record))
    }

    fn delete(&mut self, id: &RecordId) -> Result<(), StoreError> {
        let position = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.clone()))?;
        let removed = self.records.remove(position);
        if let Err(e) = self.save() {
            self.records.insert(position, removed);
            return Err(e);
        }
        Ok(())
    }
}
