// src/record.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

/// Identifier of a history record. Local stores hand out integers, but
/// imported collections may carry string ids, so both are accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => write!(f, "{id}"),
        }
    }
}

// Numeric input is treated as an integer id, anything else as a string id
impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<i64>() {
            Ok(id) => RecordId::Int(id),
            Err(_) => RecordId::Text(trimmed.to_string()),
        }
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

/// The closed set of workout categories offered when logging a session.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum WorkoutType {
    #[serde(rename = "Chest Day")]
    #[strum(serialize = "Chest Day")]
    ChestDay,
    #[serde(rename = "Back Day")]
    #[strum(serialize = "Back Day")]
    BackDay,
    #[serde(rename = "Leg Day Glutes")]
    #[strum(serialize = "Leg Day Glutes")]
    LegDayGlutes,
    #[serde(rename = "Leg Day Quads")]
    #[strum(serialize = "Leg Day Quads")]
    LegDayQuads,
    #[serde(rename = "Shoulders Day")]
    #[strum(serialize = "Shoulders Day")]
    ShouldersDay,
}

/// The fields the history views need from any record, whatever store it came from.
pub trait HistoryEntry {
    fn record_id(&self) -> &RecordId;
    fn workout_type(&self) -> &str;
    /// Calendar date as stored, `YYYY-MM-DD`.
    fn date(&self) -> &str;
}

/// A record kept only on this machine (memory or JSON file).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LocalRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub date: String,
}

/// A record that belongs to a user account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OwnedRecord {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub date: String,
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WorkoutRecord {
    // Owned first: untagged tries variants in order and user_id is the discriminator
    Owned(OwnedRecord),
    Local(LocalRecord),
}

impl WorkoutRecord {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            WorkoutRecord::Owned(r) => Some(&r.user_id),
            WorkoutRecord::Local(_) => None,
        }
    }
}

impl HistoryEntry for LocalRecord {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
    fn workout_type(&self) -> &str {
        &self.workout_type
    }
    fn date(&self) -> &str {
        &self.date
    }
}

impl HistoryEntry for OwnedRecord {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
    fn workout_type(&self) -> &str {
        &self.workout_type
    }
    fn date(&self) -> &str {
        &self.date
    }
}

impl HistoryEntry for WorkoutRecord {
    fn record_id(&self) -> &RecordId {
        match self {
            WorkoutRecord::Owned(r) => r.record_id(),
            WorkoutRecord::Local(r) => r.record_id(),
        }
    }
    fn workout_type(&self) -> &str {
        match self {
            WorkoutRecord::Owned(r) => r.workout_type(),
            WorkoutRecord::Local(r) => r.workout_type(),
        }
    }
    fn date(&self) -> &str {
        match self {
            WorkoutRecord::Owned(r) => r.date(),
            WorkoutRecord::Local(r) => r.date(),
        }
    }
}

/// Data for a record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub workout_type: String,
    pub date: NaiveDate,
}

impl NewRecord {
    pub fn new(workout_type: WorkoutType, date: NaiveDate) -> Self {
        Self {
            workout_type: workout_type.to_string(),
            date,
        }
    }

    /// Validates form input: the type must be one of [`WorkoutType`] and the
    /// date must be a real `YYYY-MM-DD` calendar date.
    pub fn parse(workout_type: &str, date: &str) -> Result<Self, crate::store::StoreError> {
        let parsed_type = WorkoutType::from_str(workout_type.trim()).map_err(|_| {
            crate::store::StoreError::UnknownWorkoutType(workout_type.trim().to_string())
        })?;
        let parsed_date = crate::history::parse_record_date(date.trim())?;
        Ok(Self::new(parsed_type, parsed_date))
    }

    /// A finished routine is logged under the routine's own name, which is
    /// free text and therefore not checked against [`WorkoutType`].
    pub fn for_routine(day_name: &str, date: NaiveDate) -> Self {
        Self {
            workout_type: day_name.to_string(),
            date,
        }
    }

    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}
