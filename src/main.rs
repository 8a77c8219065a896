//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::io;
use std::io::stdout;
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use workout_log_lib::history::{self, parse_record_date};
use workout_log_lib::{
    AppService, CompletionOutcome, DbError, HistoryEntry, MonthCursor, MonthHistory, RecordId,
    StorageKind, StoreError, WorkoutDay, WorkoutRecord, WorkoutType,
};

const LOG_ENV_VAR: &str = "WORKOUT_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli_args = cli::parse_args(); // Parse arguments once
    let export_csv = cli_args.export_csv;

    if let cli::Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Initialize the application service (loads config, connects to DB)
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = service.config.theme.header();

    match cli_args.command {
        cli::Commands::GenerateCompletion { .. } => {
            unreachable!("Completion generation should have exited already");
        }

        // --- History Commands ---
        cli::Commands::History { year, month } => {
            let mut cursor = MonthCursor::today();
            if let Some(y) = year {
                cursor.change_year(y.saturating_sub(cursor.year()));
            }
            if let Some(m) = month {
                cursor.change_month(m - 1)?;
            }
            let month_history = service.month_history(cursor)?;
            if export_csv {
                print_history_csv(&month_history.records)?;
            } else {
                print_month_history(&month_history, header_color);
            }
        }
        cli::Commands::Log { workout_type, date } => {
            let date = date.unwrap_or_else(today_string);
            match service.log_workout(&workout_type, &date) {
                Ok(record) => println!(
                    "Logged '{}' on {} ID: {}",
                    record.workout_type(),
                    record.date(),
                    record.record_id()
                ),
                Err(e) => {
                    if let Some(StoreError::UnknownWorkoutType(_)) = e.downcast_ref::<StoreError>()
                    {
                        eprintln!("Known workout types:");
                        for t in WorkoutType::iter() {
                            eprintln!("  {t}");
                        }
                    }
                    bail!("Error logging workout: {}", e);
                }
            }
        }
        cli::Commands::Delete { id } => {
            let record_id = RecordId::from(id.as_str());
            match service.delete_history_record(&record_id) {
                Ok(()) => println!("Successfully deleted workout ID {record_id}."),
                Err(e) => bail!("Error deleting workout: {}", e),
            }
        }
        cli::Commands::Types => {
            for t in WorkoutType::iter() {
                println!("{t}");
            }
        }

        // --- Workout Day Commands ---
        cli::Commands::Day { action } => match action {
            cli::DayCommands::Add { name } => {
                let id = service.add_workout_day(&name)?;
                println!("Created workout day '{}' ID: {}", name.trim(), id);
            }
            cli::DayCommands::List => {
                let days = service.list_workout_days()?;
                if days.is_empty() {
                    println!("No workout days yet. Create one with 'day add <name>'.");
                }
                for day in &days {
                    print_workout_day(day, header_color);
                }
            }
            cli::DayCommands::Delete { id } => {
                service.delete_workout_day(id)?;
                println!("Deleted workout day ID {id}.");
            }
            cli::DayCommands::Begin { id } => {
                service.begin_workout(id)?;
                let day = service.get_workout_day(id)?;
                println!(
                    "Started '{}'. Tick exercises off with 'exercise complete {} <exercise>'.",
                    day.name, id
                );
                print_workout_day(&day, header_color);
            }
            cli::DayCommands::Finish { id, date } => {
                let date = match date {
                    Some(raw) => parse_record_date(&raw)?,
                    None => Local::now().date_naive(),
                };
                let record = service.finish_workout(id, date)?;
                print_good_work(&record);
            }
        },

        // --- Exercise Commands ---
        cli::Commands::Exercise { action } => match action {
            cli::ExerciseCommands::Add {
                day,
                name,
                weights,
                reps,
            } => {
                let id = service.add_exercise(day, &name, &weights, &reps)?;
                println!("Added exercise '{}' to day {} ID: {}", name.trim(), day, id);
            }
            cli::ExerciseCommands::Edit {
                day,
                exercise,
                weights,
                reps,
            } => {
                service.edit_exercise(day, exercise, &weights, &reps)?;
                println!("Updated sets of exercise {exercise}.");
            }
            cli::ExerciseCommands::Delete { day, exercise } => {
                match service.delete_exercise(day, exercise) {
                    Ok(()) => println!("Deleted exercise {exercise} from day {day}."),
                    Err(e @ DbError::ExerciseNotFound { .. }) => bail!("{}", e),
                    Err(e) => return Err(e).context("Failed to delete exercise"),
                }
            }
            cli::ExerciseCommands::Complete {
                day,
                exercise,
                undo,
            } => {
                let today = Local::now().date_naive();
                match service.set_exercise_completed(day, exercise, !undo, today)? {
                    CompletionOutcome::Updated => {
                        print_workout_day(&service.get_workout_day(day)?, header_color);
                    }
                    CompletionOutcome::WorkoutFinished(record) => print_good_work(&record),
                }
            }
        },

        // --- Config Commands ---
        cli::Commands::SetUser { user_id } => {
            service.set_user(user_id.as_deref())?;
            match &service.config.user_id {
                Some(user) => println!("History now belongs to user '{user}'."),
                None => println!("History is now kept as local records."),
            }
        }
        cli::Commands::SetHeaderColor { color } => {
            service.set_header_color(&color)?;
            println!("Header color set to {}.", service.config.theme.header_color);
        }
        cli::Commands::SetStorage { storage } => {
            let kind = cli_storage_to_kind(storage);
            service.set_storage(kind)?;
            println!("History storage set to '{kind}'. Takes effect on the next run.");
        }
        cli::Commands::DbPath => {
            println!("Database file is located at: {:?}", service.get_db_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

// Helper to convert CLI storage enum to lib storage enum
const fn cli_storage_to_kind(storage: cli::StorageCli) -> StorageKind {
    match storage {
        cli::StorageCli::Sqlite => StorageKind::Sqlite,
        cli::StorageCli::Json => StorageKind::Json,
        cli::StorageCli::Memory => StorageKind::Memory,
    }
}

fn today_string() -> String {
    let today: NaiveDate = Local::now().date_naive();
    format!("{:04}-{:02}-{:02}", today.year(), today.month(), today.day())
}

fn print_good_work(record: &WorkoutRecord) {
    println!(
        "Good work! '{}' was added to your workout history (ID: {}).",
        record.workout_type(),
        record.record_id()
    );
}

// --- Table Printing Functions ---

fn print_month_history(month_history: &MonthHistory, header_color: Color) {
    let cursor = month_history.cursor;

    // Month strip: current month highlighted, months with workouts marked
    let mut nav = Table::new();
    nav.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(cursor.year()).fg(header_color)]);
    let cells: Vec<Cell> = month_history
        .navigation
        .iter()
        .map(|entry| {
            let label = if entry.has_activity {
                format!("{} •", entry.label)
            } else {
                entry.label.clone()
            };
            let cell = Cell::new(label);
            match (entry.is_current, entry.has_activity) {
                (true, _) => cell.add_attribute(Attribute::Bold).fg(header_color),
                (false, true) => cell.fg(Color::Blue),
                (false, false) => cell,
            }
        })
        .collect();
    nav.add_row(cells);
    println!("{nav}");

    println!("\n{}", history::month_name(cursor.month_index()));

    if month_history.records.is_empty() {
        println!("No workouts recorded for this month.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Date").fg(header_color),
        ]);
    for record in &month_history.records {
        table.add_row(vec![
            Cell::new(record.record_id()),
            Cell::new(record.workout_type()),
            // Dates were validated when the month was built
            Cell::new(
                history::display_date(record.date())
                    .unwrap_or_else(|_| record.date().to_string()),
            ),
        ]);
    }
    println!("{table}");

    let mut totals = Table::new();
    totals
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Totals").fg(header_color),
            Cell::new("Count").fg(header_color),
        ]);
    for (workout_type, count) in month_history.totals.iter() {
        totals.add_row(vec![Cell::new(workout_type), Cell::new(count)]);
    }
    totals.add_row(vec![
        Cell::new("Total Workouts").add_attribute(Attribute::Bold),
        Cell::new(month_history.totals.grand_total).add_attribute(Attribute::Bold),
    ]);
    println!("{totals}");
}

fn print_history_csv(records: &[WorkoutRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Id", "Type", "Date", "User"])?;
    for record in records {
        writer.write_record([
            record.record_id().to_string(),
            record.workout_type().to_string(),
            record.date().to_string(),
            record.user_id().unwrap_or("").to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn format_sets<T: ToString>(current: &[T], old: Option<&Vec<T>>) -> String {
    let joined = workout_log_lib::routine::join_sets(current);
    match old {
        Some(previous) => format!(
            "{joined}\n(was {})",
            workout_log_lib::routine::join_sets(previous)
        ),
        None => joined,
    }
}

/// Prints a workout day and its exercises in a formatted table.
fn print_workout_day(day: &WorkoutDay, header_color: Color) {
    let status = if day.in_progress { " (in progress)" } else { "" };
    println!("\n[{}] {}{}", day.id, day.name, status);

    let mut table = Table::new();
    let mut header = vec![
        Cell::new("ID").fg(header_color),
        Cell::new("Exercise").fg(header_color),
        Cell::new("Weight (lbs)").fg(header_color),
        Cell::new("Reps").fg(header_color),
    ];
    if day.in_progress {
        header.push(Cell::new("Completed").fg(header_color));
    }
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for exercise in &day.exercises {
        let mut row = vec![
            Cell::new(exercise.id),
            Cell::new(&exercise.name),
            Cell::new(format_sets(&exercise.weights, exercise.old_weights.as_ref())),
            Cell::new(format_sets(&exercise.reps, exercise.old_reps.as_ref())),
        ];
        if day.in_progress {
            row.push(if exercise.completed {
                Cell::new("✓").fg(Color::Green)
            } else {
                Cell::new("○")
            });
        }
        table.add_row(row);
    }
    println!("{table}");
}
