//src/db.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::LOCAL_USER_ID;
use crate::record::{NewRecord, OwnedRecord, RecordId, WorkoutRecord};
use crate::routine::{self, Exercise, WorkoutDay};
use crate::store::{StoreError, WorkoutStore};

// Custom Error type for DB operations
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection failed")]
    Connection(#[from] rusqlite::Error),
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing database file")]
    Io(#[from] std::io::Error),
    #[error("Workout day not found: ID {0}")]
    DayNotFound(i64),
    #[error("Exercise {exercise_id} not found in workout day {day_id}")]
    ExerciseNotFound { day_id: i64, exercise_id: i64 },
    #[error("Database query failed: {0}")]
    QueryFailed(rusqlite::Error),
    #[error("Database update failed: {0}")]
    UpdateFailed(rusqlite::Error),
    #[error("Database insert failed: {0}")]
    InsertFailed(rusqlite::Error),
    #[error("Database delete failed: {0}")]
    DeleteFailed(rusqlite::Error),
}

const DB_FILE_NAME: &str = "workouts.sqlite";
pub(crate) const APP_DATA_DIR: &str = "workout-log";

/// Directory holding the database and the JSON history file.
/// Creates the directory if it doesn't exist.
pub fn get_data_dir() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir)
}

/// Gets the path to the SQLite database file within the app's data directory.
pub fn get_db_path() -> Result<PathBuf, DbError> {
    Ok(get_data_dir()?.join(DB_FILE_NAME))
}

/// Opens a connection to the SQLite database.
pub fn open_db<P: AsRef<Path>>(path: P) -> Result<Connection, DbError> {
    Connection::open(path).map_err(DbError::Connection)
}

/// Initializes the database tables if they don't exist.
pub fn init_db(conn: &Connection) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS workout_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            type TEXT NOT NULL,
            date TEXT NOT NULL -- Calendar date, YYYY-MM-DD
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS workout_days (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            in_progress INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            day_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            weights TEXT NOT NULL, -- Comma-separated, one value per set
            reps TEXT NOT NULL,
            old_weights TEXT,
            old_reps TEXT,
            completed INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .map_err(DbError::Connection)?;

    add_day_owner_column_if_not_exists(conn)?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_history_user ON workout_history(user_id)",
        [],
    )
    .map_err(DbError::Connection)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_days_user ON workout_days(user_id)",
        [],
    )
    .map_err(DbError::Connection)?;

    Ok(())
}

/// Databases created before days had owners get a `user_id` column.
/// Existing days are handed to the local user.
fn add_day_owner_column_if_not_exists(conn: &Connection) -> Result<(), DbError> {
    let columns = {
        let mut stmt = conn
            .prepare("PRAGMA table_info(workout_days)")
            .map_err(DbError::QueryFailed)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(DbError::QueryFailed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::QueryFailed)?;
        names
    };
    let has_user_id = columns.iter().any(|column| column == "user_id");

    if !has_user_id {
        info!("Adding 'user_id' column to workout_days table");
        conn.execute(
            "ALTER TABLE workout_days ADD COLUMN user_id TEXT NOT NULL DEFAULT ''",
            [],
        )
        .map_err(DbError::UpdateFailed)?;
        conn.execute(
            "UPDATE workout_days SET user_id = ?1",
            params![LOCAL_USER_ID],
        )
        .map_err(DbError::UpdateFailed)?;
    }
    Ok(())
}

// ---- Workout history (backend store) ----

/// History records in the `workout_history` table, scoped to one user.
pub struct SqliteStore {
    conn: Connection,
    user_id: String,
}

impl SqliteStore {
    /// Wraps an open connection, creating the schema if needed.
    pub fn new(conn: Connection, user_id: impl Into<String>) -> Result<Self, DbError> {
        init_db(&conn)?;
        Ok(Self {
            conn,
            user_id: user_id.into(),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, user_id: impl Into<String>) -> Result<Self, DbError> {
        Self::new(open_db(path)?, user_id)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn map_row_to_record(row: &Row) -> Result<WorkoutRecord, rusqlite::Error> {
    Ok(WorkoutRecord::Owned(OwnedRecord {
        id: RecordId::Int(row.get(0)?),
        user_id: row.get(1)?,
        workout_type: row.get(2)?,
        date: row.get(3)?,
    }))
}

impl WorkoutStore for SqliteStore {
    fn list(&self) -> Result<Vec<WorkoutRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, user_id, type, date FROM workout_history WHERE user_id = ?1 ORDER BY id ASC")
            .map_err(DbError::QueryFailed)?;
        let records = stmt
            .query_map(params![self.user_id], map_row_to_record)
            .map_err(DbError::QueryFailed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::QueryFailed)?;
        Ok(records)
    }

    fn create(&mut self, new: NewRecord) -> Result<WorkoutRecord, StoreError> {
        let date = new.date_string();
        self.conn
            .execute(
                "INSERT INTO workout_history (user_id, type, date) VALUES (?1, ?2, ?3)",
                params![self.user_id, new.workout_type, date],
            )
            .map_err(DbError::InsertFailed)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, user_id = %self.user_id, %date, "Inserted workout history record");
        Ok(WorkoutRecord::Owned(OwnedRecord {
            id: RecordId::Int(id),
            workout_type: new.workout_type,
            date,
            user_id: self.user_id.clone(),
        }))
    }

    fn delete(&mut self, id: &RecordId) -> Result<(), StoreError> {
        let RecordId::Int(row_id) = id else {
            return Err(StoreError::RecordNotFound(id.clone()));
        };
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM workout_history WHERE id = ?1 AND user_id = ?2",
                params![row_id, self.user_id],
            )
            .map_err(DbError::DeleteFailed)?;
        if rows_affected == 0 {
            Err(StoreError::RecordNotFound(id.clone()))
        } else {
            Ok(())
        }
    }
}

// ---- Workout days and exercises ----

fn conversion_error(column: usize, e: routine::RoutineError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

// Helper function to map a database row to an Exercise struct
fn map_row_to_exercise(row: &Row) -> Result<Exercise, rusqlite::Error> {
    let weights_str: String = row.get(3)?;
    let reps_str: String = row.get(4)?;
    let old_weights_str: Option<String> = row.get(5)?;
    let old_reps_str: Option<String> = row.get(6)?;

    let weights = routine::parse_weights(&weights_str).map_err(|e| conversion_error(3, e))?;
    let reps = routine::parse_reps(&reps_str).map_err(|e| conversion_error(4, e))?;
    let old_weights = old_weights_str
        .map(|s| routine::parse_weights(&s))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;
    let old_reps = old_reps_str
        .map(|s| routine::parse_reps(&s))
        .transpose()
        .map_err(|e| conversion_error(6, e))?;

    Ok(Exercise {
        id: row.get(0)?,
        day_id: row.get(1)?,
        name: row.get(2)?,
        weights,
        reps,
        old_weights,
        old_reps,
        completed: row.get(7)?,
    })
}

const EXERCISE_COLUMNS: &str =
    "id, day_id, name, weights, reps, old_weights, old_reps, completed";

fn list_exercises_for_day(conn: &Connection, day_id: i64) -> Result<Vec<Exercise>, DbError> {
    let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE day_id = ?1 ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql).map_err(DbError::QueryFailed)?;
    let exercises = stmt
        .query_map(params![day_id], map_row_to_exercise)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;
    Ok(exercises)
}

pub fn count_workout_days(conn: &Connection, user_id: &str) -> Result<i64, DbError> {
    conn.query_row(
        "SELECT COUNT(*) FROM workout_days WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )
    .map_err(DbError::QueryFailed)
}

/// Creates a workout day owned by `user_id`. Returns the ID.
pub fn create_workout_day(conn: &Connection, user_id: &str, name: &str) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO workout_days (user_id, name, in_progress) VALUES (?1, ?2, 0)",
        params![user_id, name],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

fn map_row_to_day(row: &Row) -> Result<WorkoutDay, rusqlite::Error> {
    Ok(WorkoutDay {
        id: row.get(0)?,
        name: row.get(1)?,
        in_progress: row.get(2)?,
        exercises: Vec::new(),
    })
}

/// Lists the user's workout days with their exercises, oldest first.
pub fn list_workout_days(conn: &Connection, user_id: &str) -> Result<Vec<WorkoutDay>, DbError> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, in_progress FROM workout_days WHERE user_id = ?1 ORDER BY id ASC",
        )
        .map_err(DbError::QueryFailed)?;
    let days = stmt
        .query_map(params![user_id], map_row_to_day)
        .map_err(DbError::QueryFailed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DbError::QueryFailed)?;

    days.into_iter()
        .map(|mut day| {
            day.exercises = list_exercises_for_day(conn, day.id)?;
            Ok(day)
        })
        .collect()
}

/// Retrieves one of the user's workout days with its exercises.
pub fn get_workout_day(
    conn: &Connection,
    user_id: &str,
    day_id: i64,
) -> Result<Option<WorkoutDay>, DbError> {
    let day = conn
        .query_row(
            "SELECT id, name, in_progress FROM workout_days WHERE id = ?1 AND user_id = ?2",
            params![day_id, user_id],
            map_row_to_day,
        )
        .optional()
        .map_err(DbError::QueryFailed)?;

    match day {
        Some(mut day) => {
            day.exercises = list_exercises_for_day(conn, day.id)?;
            Ok(Some(day))
        }
        None => Ok(None),
    }
}

/// Deletes one of the user's workout days and its exercises.
pub fn delete_workout_day(conn: &mut Connection, user_id: &str, day_id: i64) -> Result<(), DbError> {
    let tx = conn.transaction().map_err(DbError::DeleteFailed)?;
    let rows_affected = tx
        .execute(
            "DELETE FROM workout_days WHERE id = ?1 AND user_id = ?2",
            params![day_id, user_id],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows_affected == 0 {
        // Dropping the transaction rolls it back
        return Err(DbError::DayNotFound(day_id));
    }
    tx.execute("DELETE FROM exercises WHERE day_id = ?1", params![day_id])
        .map_err(DbError::DeleteFailed)?;
    tx.commit().map_err(DbError::DeleteFailed)?;
    Ok(())
}

pub fn set_day_in_progress(
    conn: &Connection,
    user_id: &str,
    day_id: i64,
    in_progress: bool,
) -> Result<(), DbError> {
    let rows_affected = conn
        .execute(
            "UPDATE workout_days SET in_progress = ?1 WHERE id = ?2 AND user_id = ?3",
            params![in_progress, day_id, user_id],
        )
        .map_err(DbError::UpdateFailed)?;
    if rows_affected == 0 {
        Err(DbError::DayNotFound(day_id))
    } else {
        Ok(())
    }
}

/// Clears the completed flag on every exercise of one of the user's days.
pub fn reset_day_completion(conn: &Connection, user_id: &str, day_id: i64) -> Result<usize, DbError> {
    conn.execute(
        "UPDATE exercises SET completed = 0
         WHERE day_id = ?1
           AND day_id IN (SELECT id FROM workout_days WHERE user_id = ?2)",
        params![day_id, user_id],
    )
    .map_err(DbError::UpdateFailed)
}

/// Adds an exercise to a day. Returns the ID.
pub fn create_exercise(
    conn: &Connection,
    day_id: i64,
    name: &str,
    weights: &[f64],
    reps: &[i64],
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO exercises (day_id, name, weights, reps, completed) VALUES (?1, ?2, ?3, ?4, 0)",
        params![
            day_id,
            name,
            routine::join_sets(weights),
            routine::join_sets(reps)
        ],
    )
    .map_err(DbError::InsertFailed)?;
    Ok(conn.last_insert_rowid())
}

/// Replaces an exercise's sets, keeping the previous ones in `old_weights`/`old_reps`.
pub fn update_exercise_sets(
    conn: &Connection,
    user_id: &str,
    day_id: i64,
    exercise_id: i64,
    weights: &[f64],
    reps: &[i64],
) -> Result<(), DbError> {
    // SQLite evaluates the right-hand sides against the row before the update
    let rows_affected = conn
        .execute(
            "UPDATE exercises
             SET old_weights = weights, old_reps = reps, weights = ?1, reps = ?2
             WHERE id = ?3 AND day_id = ?4
               AND day_id IN (SELECT id FROM workout_days WHERE user_id = ?5)",
            params![
                routine::join_sets(weights),
                routine::join_sets(reps),
                exercise_id,
                day_id,
                user_id
            ],
        )
        .map_err(DbError::UpdateFailed)?;
    if rows_affected == 0 {
        Err(DbError::ExerciseNotFound {
            day_id,
            exercise_id,
        })
    } else {
        Ok(())
    }
}

pub fn delete_exercise(
    conn: &Connection,
    user_id: &str,
    day_id: i64,
    exercise_id: i64,
) -> Result<(), DbError> {
    let rows_affected = conn
        .execute(
            "DELETE FROM exercises WHERE id = ?1 AND day_id = ?2
               AND day_id IN (SELECT id FROM workout_days WHERE user_id = ?3)",
            params![exercise_id, day_id, user_id],
        )
        .map_err(DbError::DeleteFailed)?;
    if rows_affected == 0 {
        Err(DbError::ExerciseNotFound {
            day_id,
            exercise_id,
        })
    } else {
        Ok(())
    }
}

pub fn set_exercise_completed(
    conn: &Connection,
    user_id: &str,
    day_id: i64,
    exercise_id: i64,
    completed: bool,
) -> Result<(), DbError> {
    let rows_affected = conn
        .execute(
            "UPDATE exercises SET completed = ?1
             WHERE id = ?2 AND day_id = ?3
               AND day_id IN (SELECT id FROM workout_days WHERE user_id = ?4)",
            params![completed, exercise_id, day_id, user_id],
        )
        .map_err(DbError::UpdateFailed)?;
    if rows_affected == 0 {
        Err(DbError::ExerciseNotFound {
            day_id,
            exercise_id,
        })
    } else {
        Ok(())
    }
}
