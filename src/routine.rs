// src/routine.rs
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RoutineError {
    #[error("Workout day name cannot be empty.")]
    EmptyDayName,
    #[error("Exercise {0} is required.")]
    MissingField(&'static str),
    #[error("Invalid number in {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Workout day {0} is not in progress. Begin the workout first.")]
    NotInProgress(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub day_id: i64,
    pub name: String,
    /// One entry per set
    pub weights: Vec<f64>,
    pub reps: Vec<i64>,
    /// Values before the last edit, shown struck through
    pub old_weights: Option<Vec<f64>>,
    pub old_reps: Option<Vec<i64>>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDay {
    pub id: i64,
    pub name: String,
    pub in_progress: bool,
    pub exercises: Vec<Exercise>,
}

impl WorkoutDay {
    /// True once every exercise is ticked off. A day without exercises is
    /// never complete.
    pub fn all_completed(&self) -> bool {
        !self.exercises.is_empty() && self.exercises.iter().all(|ex| ex.completed)
    }

    pub fn exercise(&self, exercise_id: i64) -> Option<&Exercise> {
        self.exercises.iter().find(|ex| ex.id == exercise_id)
    }
}

/// Parses a comma separated list of weights, e.g. `"90, 110, 120"`.
pub fn parse_weights(input: &str) -> Result<Vec<f64>, RoutineError> {
    parse_list(input, "weights", |s| {
        s.parse::<f64>().ok().filter(|w| w.is_finite() && *w >= 0.0)
    })
}

/// Parses a comma separated list of rep counts, e.g. `"12,9,6"`.
pub fn parse_reps(input: &str) -> Result<Vec<i64>, RoutineError> {
    parse_list(input, "reps", |s| s.parse::<i64>().ok().filter(|r| *r >= 0))
}

fn parse_list<T>(
    input: &str,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, RoutineError> {
    if input.trim().is_empty() {
        return Err(RoutineError::MissingField(field));
    }
    input
        .split(',')
        .map(str::trim)
        .map(|part| {
            parse(part).ok_or_else(|| RoutineError::InvalidNumber {
                field,
                value: part.to_string(),
            })
        })
        .collect()
}

/// Formats sets back into the comma separated form used for storage and display.
pub fn join_sets<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct SeedExercise {
    pub name: &'static str,
    pub weights: &'static [f64],
    pub reps: &'static [i64],
}

pub struct SeedDay {
    pub name: &'static str,
    pub exercises: &'static [SeedExercise],
}

/// Routine created for a user with no workout days yet.
pub const DEFAULT_ROUTINE: &[SeedDay] = &[
    SeedDay {
        name: "Chest Day",
        exercises: &[
            SeedExercise {
                name: "Bench Press",
                weights: &[90.0, 110.0, 120.0],
                reps: &[12, 9, 6],
            },
            SeedExercise {
                name: "Incline Bench Press",
                weights: &[80.0, 100.0, 110.0],
                reps: &[12, 9, 6],
            },
        ],
    },
    SeedDay {
        name: "Back Day",
        exercises: &[
            SeedExercise {
                name: "Deadlift",
                weights: &[135.0, 155.0, 185.0],
                reps: &[10, 8, 6],
            },
            SeedExercise {
                name: "Pullups",
                weights: &[0.0],
                reps: &[10, 10, 10],
            },
        ],
    },
];
