// src/lib.rs
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// --- Declare modules ---
mod config;
pub mod db;
pub mod history;
pub mod record;
pub mod routine;
pub mod store;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, StorageKind, Theme,
    LOCAL_USER_ID,
};
pub use db::{get_db_path as get_db_path_util, DbError, SqliteStore};
pub use history::{
    ActivityIndex, HistoryError, MonthBucket, MonthCursor, MonthNavEntry, MonthTotals, TypeTotal,
};
pub use record::{
    HistoryEntry, LocalRecord, NewRecord, OwnedRecord, RecordId, WorkoutRecord, WorkoutType,
};
pub use routine::{Exercise, RoutineError, WorkoutDay};
pub use store::{JsonFileStore, MemoryStore, StoreError, WorkoutStore};

const HISTORY_FILE_NAME: &str = "history.json";

/// One month of history, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthHistory {
    pub cursor: MonthCursor,
    pub navigation: Vec<MonthNavEntry>,
    /// Records of the viewed month, oldest first
    pub records: Vec<WorkoutRecord>,
    pub totals: MonthTotals,
}

/// Outcome of ticking an exercise off.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Updated,
    /// That was the last open exercise; the workout was logged to history
    WorkoutFinished(WorkoutRecord),
}

pub struct AppService {
    pub config: Config,
    /// Workout days and exercises
    pub conn: Connection,
    /// Workout history records
    pub store: Box<dyn WorkoutStore>,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

/// Builds the history store selected in the config.
/// # Errors
/// Returns `anyhow::Error` if the store cannot be opened.
pub fn open_store(config: &Config, db_path: &Path) -> Result<Box<dyn WorkoutStore>> {
    let store: Box<dyn WorkoutStore> = match config.storage {
        StorageKind::Sqlite => Box::new(
            SqliteStore::open(db_path, config.effective_user_id())
                .with_context(|| format!("Failed to open history table in {db_path:?}"))?,
        ),
        StorageKind::Json => {
            let path = db::get_data_dir()
                .context("Failed to determine data directory")?
                .join(HISTORY_FILE_NAME);
            Box::new(
                JsonFileStore::open(&path)
                    .with_context(|| format!("Failed to open history file {path:?}"))?,
            )
        }
        StorageKind::Memory => Box::new(MemoryStore::new()),
    };
    Ok(store)
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/db path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let db_path = db::get_db_path().context("Failed to determine database path")?;
        let conn = db::open_db(&db_path)
            .with_context(|| format!("Failed to open database at {db_path:?}"))?;
        db::init_db(&conn).context("Failed to initialize database schema")?;

        let store = open_store(&config, &db_path)?;
        info!(storage = %config.storage, user = config.effective_user_id(), "Service initialized");

        let service = Self {
            config,
            conn,
            store,
            db_path,
            config_path,
        };
        if service.config.seed_default_routine {
            service.seed_default_routine()?;
        }
        Ok(service)
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the account that owns history records and workout days. `None` goes back to local records.
    /// Workout days follow the new user at once; the history store on the next start.
    /// # Errors
    /// - `ConfigError::EmptyUserId` if the id is blank.
    /// - `ConfigError` variants if saving fails.
    pub fn set_user(&mut self, user_id: Option<&str>) -> Result<(), ConfigError> {
        let user_id = match user_id.map(str::trim) {
            Some("") => return Err(ConfigError::EmptyUserId),
            other => other.map(str::to_string),
        };
        self.config.user_id = user_id;
        self.save_config()
    }

    /// Sets the table header color.
    /// # Errors
    /// - `ConfigError::InvalidColor` if the name is not a known color.
    /// - `ConfigError` variants if saving fails.
    pub fn set_header_color(&mut self, color: &str) -> Result<(), ConfigError> {
        let parsed = parse_color(color)?;
        self.config.theme.header_color = format!("{parsed:?}");
        self.save_config()
    }

    /// Selects the history store. Takes effect on the next start.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_storage(&mut self, storage: StorageKind) -> Result<(), ConfigError> {
        self.config.storage = storage;
        self.save_config()
    }

    // --- Workout history ---

    /// All history records.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `StoreError` if the store cannot be read.
    pub fn list_history(&self) -> Result<Vec<WorkoutRecord>> {
        self.store
            .list()
            .context("Failed to list workout history")
    }

    /// Logs a workout from form input.
    /// # Errors
    /// - `StoreError::UnknownWorkoutType` if `workout_type` is not a known type.
    /// - `StoreError::InvalidDate` if `date` is not a valid `YYYY-MM-DD` date.
    /// - `anyhow::Error` wrapping store failures.
    pub fn log_workout(&mut self, workout_type: &str, date: &str) -> Result<WorkoutRecord> {
        let new = NewRecord::parse(workout_type, date)?;
        self.store
            .create(new)
            .context("Failed to save workout record")
    }

    /// Deletes one history record.
    /// # Errors
    /// Returns `StoreError::RecordNotFound` if no record has this id.
    pub fn delete_history_record(&mut self, id: &RecordId) -> Result<(), StoreError> {
        self.store.delete(id)?;
        debug!(%id, "Deleted workout history record");
        Ok(())
    }

    /// Navigation, records and totals for the month under `cursor`.
    /// # Errors
    /// Returns `anyhow::Error` if the store fails or a stored date is malformed.
    pub fn month_history(&self, cursor: MonthCursor) -> Result<MonthHistory> {
        let records = self.list_history()?;
        let summary = history::summarize_month(&records, cursor.bucket())
            .with_context(|| format!("Failed to build history for {}", cursor.bucket()))?;
        Ok(MonthHistory {
            cursor,
            navigation: history::month_navigation(&cursor, &summary.activity),
            records: summary.records.into_iter().cloned().collect(),
            totals: summary.totals,
        })
    }

    // --- Workout days ---

    /// The user whose workout days are read and written.
    pub fn user_id(&self) -> &str {
        self.config.effective_user_id()
    }

    /// Creates the starter routine if the current user has no workout days yet.
    /// Returns whether anything was created.
    /// # Errors
    /// Returns `anyhow::Error` wrapping `DbError` variants.
    pub fn seed_default_routine(&self) -> Result<bool> {
        if db::count_workout_days(&self.conn, self.user_id())? > 0 {
            return Ok(false);
        }
        for day in routine::DEFAULT_ROUTINE {
            let day_id = db::create_workout_day(&self.conn, self.user_id(), day.name)?;
            for exercise in day.exercises {
                db::create_exercise(
                    &self.conn,
                    day_id,
                    exercise.name,
                    exercise.weights,
                    exercise.reps,
                )?;
            }
        }
        info!(user = self.user_id(), "Created default workout routine");
        Ok(true)
    }

    /// Creates a new, empty workout day.
    /// # Errors
    /// - `RoutineError::EmptyDayName` if the name is blank.
    /// - `anyhow::Error` wrapping `DbError` variants.
    pub fn add_workout_day(&self, name: &str) -> Result<i64> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!(RoutineError::EmptyDayName);
        }
        db::create_workout_day(&self.conn, self.user_id(), trimmed)
            .with_context(|| format!("Failed to create workout day '{trimmed}'"))
    }

    /// # Errors
    /// Returns `anyhow::Error` wrapping `DbError` variants.
    pub fn list_workout_days(&self) -> Result<Vec<WorkoutDay>> {
        db::list_workout_days(&self.conn, self.user_id()).context("Failed to list workout days")
    }

    /// # Errors
    /// Returns `DbError::DayNotFound` if no day has this id.
    pub fn get_workout_day(&self, day_id: i64) -> Result<WorkoutDay, DbError> {
        db::get_workout_day(&self.conn, self.user_id(), day_id)?
            .ok_or(DbError::DayNotFound(day_id))
    }

    /// # Errors
    /// Returns `DbError::DayNotFound` if no day has this id.
    pub fn delete_workout_day(&mut self, day_id: i64) -> Result<(), DbError> {
        db::delete_workout_day(&mut self.conn, self.config.effective_user_id(), day_id)
    }

    /// Adds an exercise from form input. Weights and reps are comma separated, one value per set.
    /// # Errors
    /// - `RoutineError::MissingField` if the name, weights or reps are blank.
    /// - `RoutineError::InvalidNumber` if a set value does not parse.
    /// - `DbError::DayNotFound` if the day does not exist.
    pub fn add_exercise(&self, day_id: i64, name: &str, weights: &str, reps: &str) -> Result<i64> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!(RoutineError::MissingField("name"));
        }
        let weights = routine::parse_weights(weights)?;
        let reps = routine::parse_reps(reps)?;
        self.get_workout_day(day_id)?;
        db::create_exercise(&self.conn, day_id, trimmed, &weights, &reps)
            .with_context(|| format!("Failed to add exercise '{trimmed}'"))
    }

    /// Replaces an exercise's sets; the old sets are kept for display.
    /// # Errors
    /// - `RoutineError` variants if a set list is blank or invalid.
    /// - `DbError::ExerciseNotFound` if the exercise is not part of the day.
    pub fn edit_exercise(
        &self,
        day_id: i64,
        exercise_id: i64,
        weights: &str,
        reps: &str,
    ) -> Result<()> {
        let weights = routine::parse_weights(weights)?;
        let reps = routine::parse_reps(reps)?;
        db::update_exercise_sets(&self.conn, self.user_id(), day_id, exercise_id, &weights, &reps)?;
        Ok(())
    }

    /// # Errors
    /// Returns `DbError::ExerciseNotFound` if the exercise is not part of the day.
    pub fn delete_exercise(&self, day_id: i64, exercise_id: i64) -> Result<(), DbError> {
        db::delete_exercise(&self.conn, self.user_id(), day_id, exercise_id)
    }

    /// Starts a session: the day goes in progress with every exercise unticked.
    /// # Errors
    /// Returns `DbError::DayNotFound` if no day has this id.
    pub fn begin_workout(&self, day_id: i64) -> Result<(), DbError> {
        db::set_day_in_progress(&self.conn, self.user_id(), day_id, true)?;
        db::reset_day_completion(&self.conn, self.user_id(), day_id)?;
        Ok(())
    }

    /// Ticks an exercise on or off. Ticking the last open exercise of an
    /// in-progress day finishes the workout on `today`.
    /// # Errors
    /// - `RoutineError::NotInProgress` if the day was not begun.
    /// - `DbError` variants if the day or exercise does not exist.
    pub fn set_exercise_completed(
        &mut self,
        day_id: i64,
        exercise_id: i64,
        completed: bool,
        today: NaiveDate,
    ) -> Result<CompletionOutcome> {
        let day = self.get_workout_day(day_id)?;
        if !day.in_progress {
            bail!(RoutineError::NotInProgress(day_id));
        }
        db::set_exercise_completed(&self.conn, self.user_id(), day_id, exercise_id, completed)?;

        let day = self.get_workout_day(day_id)?;
        if completed && day.all_completed() {
            let record = self.finish_workout(day_id, today)?;
            return Ok(CompletionOutcome::WorkoutFinished(record));
        }
        Ok(CompletionOutcome::Updated)
    }

    /// Logs a begun day to history under its own name and resets it for next time.
    /// # Errors
    /// - `DbError::DayNotFound` if no day has this id.
    /// - `RoutineError::NotInProgress` if the day was not begun.
    /// - `anyhow::Error` wrapping store failures.
    pub fn finish_workout(&mut self, day_id: i64, date: NaiveDate) -> Result<WorkoutRecord> {
        let day = self.get_workout_day(day_id)?;
        if !day.in_progress {
            bail!(RoutineError::NotInProgress(day_id));
        }
        let record = self
            .store
            .create(NewRecord::for_routine(&day.name, date))
            .with_context(|| format!("Failed to save finished workout '{}'", day.name))?;
        db::set_day_in_progress(&self.conn, self.user_id(), day_id, false)?;
        db::reset_day_completion(&self.conn, self.user_id(), day_id)?;
        info!(day = %day.name, id = %record.record_id(), "Workout finished");
        Ok(record)
    }
}
