// src/history.rs
//! Month-by-month view over a workout history collection.
//!
//! Everything here is a pure function of the records passed in: bucketing a
//! stored date into a calendar month, marking which months have activity,
//! selecting one month's records in date order, and totalling them by type.
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::record::{HistoryEntry, RecordId};

const NOON_HOUR: i64 = 12;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Invalid date format: '{0}' (expected a valid YYYY-MM-DD date)")]
    InvalidDateFormat(String),
    #[error("Workout record {id} has an unreadable date: {source}")]
    InvalidRecordDate {
        id: RecordId,
        #[source]
        source: Box<HistoryError>,
    },
    #[error("Month index out of range: {0} (expected 0-11)")]
    InvalidMonthIndex(u32),
}

impl HistoryError {
    /// The malformed date string behind this error, if any.
    pub fn invalid_date(&self) -> Option<&str> {
        match self {
            HistoryError::InvalidDateFormat(raw) => Some(raw),
            HistoryError::InvalidRecordDate { source, .. } => source.invalid_date(),
            HistoryError::InvalidMonthIndex(_) => None,
        }
    }
}

/// A calendar month. `month_index` is zero based (January = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthBucket {
    pub year: i32,
    pub month_index: u32,
}

impl MonthBucket {
    pub fn new(year: i32, month_index: u32) -> Result<Self, HistoryError> {
        if month_index > 11 {
            return Err(HistoryError::InvalidMonthIndex(month_index));
        }
        Ok(Self { year, month_index })
    }

    fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month_index: date.month0(),
        }
    }

    /// Key used by the activity index, e.g. `"2024-0"` for January 2024.
    pub fn key(&self) -> String {
        format!("{}-{}", self.year, self.month_index)
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", month_name(self.month_index), self.year)
    }
}

fn parse_component(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Parses a stored `YYYY-MM-DD` date by splitting it into its three numeric
/// components. Year must be 1-9999 and the day must exist in that month.
pub fn parse_record_date(raw: &str) -> Result<NaiveDate, HistoryError> {
    let invalid = || HistoryError::InvalidDateFormat(raw.to_string());

    let mut parts = raw.split('-');
    let (Some(y), Some(m), Some(d), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let year = parse_component(y).ok_or_else(invalid)?;
    let month = parse_component(m).ok_or_else(invalid)?;
    let day = parse_component(d).ok_or_else(invalid)?;

    if !(1..=9999).contains(&year) {
        return Err(invalid());
    }
    let year = i32::try_from(year).map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Buckets a calendar date as seen from `zone`. The date is pinned to local
/// noon before reading year and month back, so no offset between UTC-12 and
/// UTC+14 can roll it into a neighbouring day.
pub fn bucket_for_date<Tz: TimeZone>(date: NaiveDate, zone: &Tz) -> MonthBucket {
    let noon = date.and_time(NaiveTime::default()) + Duration::hours(NOON_HOUR);
    let anchored = zone
        .from_local_datetime(&noon)
        .earliest()
        .map(|dt| dt.naive_local())
        .unwrap_or(noon);
    MonthBucket::of(anchored.date())
}

/// Parses and buckets a stored date string as seen from `zone`.
pub fn bucket_in_zone<Tz: TimeZone>(raw: &str, zone: &Tz) -> Result<MonthBucket, HistoryError> {
    parse_record_date(raw).map(|date| bucket_for_date(date, zone))
}

/// Parses and buckets a stored date string in the machine's local zone.
pub fn bucket_of(raw: &str) -> Result<MonthBucket, HistoryError> {
    bucket_in_zone(raw, &Local)
}

fn entry_date<R: HistoryEntry>(record: &R) -> Result<NaiveDate, HistoryError> {
    parse_record_date(record.date()).map_err(|e| HistoryError::InvalidRecordDate {
        id: record.record_id().clone(),
        source: Box::new(e),
    })
}

/// Months that contain at least one workout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityIndex {
    months: BTreeSet<MonthBucket>,
}

impl ActivityIndex {
    pub fn contains(&self, bucket: MonthBucket) -> bool {
        self.months.contains(&bucket)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.months.iter().any(|bucket| bucket.key() == key)
    }

    /// Keys in chronological order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.months.iter().map(MonthBucket::key)
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// Builds the set of active months from the whole collection.
pub fn month_activity_index<R: HistoryEntry>(records: &[R]) -> Result<ActivityIndex, HistoryError> {
    let mut months = BTreeSet::new();
    for record in records {
        months.insert(bucket_for_date(entry_date(record)?, &Local));
    }
    Ok(ActivityIndex { months })
}

/// Records falling in `target`, oldest first. Records on the same date keep
/// their collection order.
pub fn filter_month<R: HistoryEntry>(
    records: &[R],
    target: MonthBucket,
) -> Result<Vec<&R>, HistoryError> {
    let mut matching = Vec::new();
    for record in records {
        let date = entry_date(record)?;
        if bucket_for_date(date, &Local) == target {
            matching.push((date, record));
        }
    }
    // sort_by_key is stable
    matching.sort_by_key(|(date, _)| *date);
    Ok(matching.into_iter().map(|(_, record)| record).collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTotal {
    pub workout_type: String,
    pub count: usize,
}

/// Per-type counts for one month, in order of each type's first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthTotals {
    pub by_type: Vec<TypeTotal>,
    pub grand_total: usize,
}

impl MonthTotals {
    pub fn get(&self, workout_type: &str) -> Option<usize> {
        self.by_type
            .iter()
            .find(|t| t.workout_type == workout_type)
            .map(|t| t.count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_type
            .iter()
            .map(|t| (t.workout_type.as_str(), t.count))
    }
}

/// Counts records by their literal type string. Types outside the
/// [`crate::WorkoutType`] list are counted like any other.
pub fn month_totals<R: HistoryEntry>(records: &[&R]) -> MonthTotals {
    let mut by_type: Vec<TypeTotal> = Vec::new();
    for record in records {
        match by_type
            .iter_mut()
            .find(|t| t.workout_type == record.workout_type())
        {
            Some(total) => total.count += 1,
            None => by_type.push(TypeTotal {
                workout_type: record.workout_type().to_string(),
                count: 1,
            }),
        }
    }
    MonthTotals {
        by_type,
        grand_total: records.len(),
    }
}

/// Everything needed to render one month of history.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary<'a, R> {
    pub bucket: MonthBucket,
    pub records: Vec<&'a R>,
    pub totals: MonthTotals,
    pub activity: ActivityIndex,
}

pub fn summarize_month<R: HistoryEntry>(
    records: &[R],
    target: MonthBucket,
) -> Result<MonthSummary<'_, R>, HistoryError> {
    let activity = month_activity_index(records)?;
    let filtered = filter_month(records, target)?;
    let totals = month_totals(&filtered);
    Ok(MonthSummary {
        bucket: target,
        records: filtered,
        totals,
        activity,
    })
}

// --- Month cursor and navigation ---

/// The month currently being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    bucket: MonthBucket,
}

impl MonthCursor {
    pub fn new(year: i32, month_index: u32) -> Result<Self, HistoryError> {
        Ok(Self {
            bucket: MonthBucket::new(year.clamp(1, 9999), month_index)?,
        })
    }

    pub fn today() -> Self {
        Self::containing(Local::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            bucket: MonthBucket::of(date),
        }
    }

    pub const fn bucket(&self) -> MonthBucket {
        self.bucket
    }

    pub const fn year(&self) -> i32 {
        self.bucket.year
    }

    pub const fn month_index(&self) -> u32 {
        self.bucket.month_index
    }

    /// Jumps to another month of the same year.
    pub fn change_month(&mut self, month_index: u32) -> Result<(), HistoryError> {
        self.bucket = MonthBucket::new(self.bucket.year, month_index)?;
        Ok(())
    }

    /// Moves by whole years, keeping the month. Stays within years 1-9999.
    pub fn change_year(&mut self, delta: i32) {
        self.bucket.year = self.bucket.year.saturating_add(delta).clamp(1, 9999);
    }

    /// First day of the viewed month, the default date for a new entry.
    pub fn first_day(&self) -> String {
        format!("{:04}-{:02}-01", self.bucket.year, self.bucket.month_index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthNavEntry {
    pub month_index: u32,
    pub label: String,
    pub is_current: bool,
    pub has_activity: bool,
}

/// One entry per month of the cursor's year.
pub fn month_navigation(cursor: &MonthCursor, activity: &ActivityIndex) -> Vec<MonthNavEntry> {
    (0..12)
        .map(|month_index| MonthNavEntry {
            month_index,
            label: month_name(month_index)[..3].to_uppercase(),
            is_current: month_index == cursor.month_index(),
            has_activity: activity.contains(MonthBucket {
                year: cursor.year(),
                month_index,
            }),
        })
        .collect()
}

pub fn month_name(month_index: u32) -> &'static str {
    MONTH_NAMES
        .get(month_index as usize)
        .copied()
        .unwrap_or("Unknown")
}

/// Short form for list rows, e.g. `"Jan 5"`.
pub fn display_date(raw: &str) -> Result<String, HistoryError> {
    let date = parse_record_date(raw)?;
    Ok(format!("{} {}", &month_name(date.month0())[..3], date.day()))
}
