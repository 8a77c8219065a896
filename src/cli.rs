// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Log workouts and browse your workout history", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print history as CSV instead of tables
    #[arg(long, global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageCli {
    Sqlite,
    Json,
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show one month of workout history with totals
    History {
        /// Year to show (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
        /// Month to show, 1-12 (defaults to the current month)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Add a workout to the history
    Log {
        /// Workout type, e.g. "Chest Day" (see `types`)
        #[arg(short = 't', long = "type")]
        workout_type: String,
        /// Date of the workout, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Delete a workout from the history
    Delete {
        /// ID of the history record
        id: String,
    },
    /// List the workout types that can be logged
    Types,
    /// Manage workout days (routines)
    Day {
        #[command(subcommand)]
        action: DayCommands,
    },
    /// Manage the exercises of a workout day
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommands,
    },
    /// Set the account history records belong to. Omit to use local records.
    SetUser { user_id: Option<String> },
    /// Set the table header color
    SetHeaderColor { color: String },
    /// Choose where workout history is stored
    SetStorage {
        #[arg(value_enum)]
        storage: StorageCli,
    },
    /// Show the path to the database file
    DbPath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion script
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DayCommands {
    /// Create a new workout day
    Add { name: String },
    /// List workout days and their exercises
    List,
    /// Delete a workout day and its exercises
    Delete { id: i64 },
    /// Begin a workout: exercises can then be ticked off
    Begin { id: i64 },
    /// Finish a workout and add it to the history
    Finish {
        id: i64,
        /// Date to log the workout on, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExerciseCommands {
    /// Add an exercise to a workout day
    Add {
        /// ID of the workout day
        day: i64,
        /// Name of the exercise, e.g. "Bench Press"
        name: String,
        /// Comma-separated weight per set, e.g. "90,110,120"
        #[arg(short, long)]
        weights: String,
        /// Comma-separated reps per set, e.g. "12,9,6"
        #[arg(short, long)]
        reps: String,
    },
    /// Replace the sets of an exercise
    Edit {
        day: i64,
        exercise: i64,
        #[arg(short, long)]
        weights: String,
        #[arg(short, long)]
        reps: String,
    },
    /// Remove an exercise from a workout day
    Delete { day: i64, exercise: i64 },
    /// Tick an exercise off during a workout
    Complete {
        day: i64,
        exercise: i64,
        /// Untick instead
        #[arg(long)]
        undo: bool,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
