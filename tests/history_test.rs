use anyhow::Result;
use chrono::{FixedOffset, NaiveDate, Utc};
use workout_log_lib::history::{
    bucket_in_zone, bucket_of, display_date, filter_month, month_activity_index,
    month_navigation, month_name, month_totals, parse_record_date, summarize_month,
};
use workout_log_lib::{
    HistoryEntry, HistoryError, LocalRecord, MonthBucket, MonthCursor, OwnedRecord, RecordId,
    WorkoutRecord,
};

fn record(id: i64, workout_type: &str, date: &str) -> LocalRecord {
    LocalRecord {
        id: RecordId::Int(id),
        workout_type: workout_type.to_string(),
        date: date.to_string(),
    }
}

fn sample_records() -> Vec<LocalRecord> {
    vec![
        record(1, "Chest Day", "2024-01-05"),
        record(2, "Leg Day Quads", "2024-01-08"),
        record(3, "Back Day", "2024-02-12"),
    ]
}

fn january_2024() -> MonthBucket {
    MonthBucket::new(2024, 0).unwrap()
}

fn ids<R: HistoryEntry>(records: &[&R]) -> Vec<RecordId> {
    records.iter().map(|r| r.record_id().clone()).collect()
}

// A larger, unordered collection spread over several years
fn generated_records() -> Vec<LocalRecord> {
    let types = ["Chest Day", "Back Day", "Leg Day Glutes", "Leg Day Quads", "Shoulders Day"];
    (0..120)
        .map(|i: i64| {
            let year = 2022 + (i * 7) % 3;
            let month = 1 + (i * 5) % 12;
            let day = 1 + (i * 11) % 28;
            record(
                i,
                types[(i % 5) as usize],
                &format!("{year:04}-{month:02}-{day:02}"),
            )
        })
        .collect()
}

#[test]
fn test_parse_valid_dates() -> Result<()> {
    assert_eq!(
        parse_record_date("2024-01-05")?,
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    );
    assert_eq!(
        parse_record_date("2024-02-29")?,
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    assert_eq!(
        parse_record_date("0001-01-01")?,
        NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
    );
    assert_eq!(
        parse_record_date("9999-12-31")?,
        NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
    );
    Ok(())
}

#[test]
fn test_parse_rejects_malformed_dates() {
    let bad = [
        "2024-13-01",
        "2024-00-10",
        "2024-02-30",
        "2023-02-29",
        "2024-04-31",
        "0000-01-01",
        "10000-01-01",
        "2024/01/05",
        "2024-01",
        "2024-01-05-01",
        "",
        "2024-1a-05",
        "-2024-01-05",
        "2024-01-05T00:00:00Z",
        " 2024-01-05",
        "2024-+1-05",
    ];
    for raw in bad {
        match parse_record_date(raw) {
            Err(HistoryError::InvalidDateFormat(s)) => assert_eq!(s, raw),
            other => panic!("expected InvalidDateFormat for {raw:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_invalid_month_is_not_bucketed() {
    let result = bucket_of("2024-13-01");
    assert!(matches!(result, Err(HistoryError::InvalidDateFormat(_))));
}

#[test]
fn test_bucketing_is_timezone_invariant() -> Result<()> {
    let far_west = FixedOffset::west_opt(12 * 3600).unwrap();
    let far_east = FixedOffset::east_opt(14 * 3600).unwrap();

    let cases = [
        ("2024-01-01", 2024, 0),
        ("2024-01-31", 2024, 0),
        ("2024-02-01", 2024, 1),
        ("2024-12-31", 2024, 11),
        ("2025-01-01", 2025, 0),
        ("2024-02-29", 2024, 1),
    ];
    for (raw, year, month_index) in cases {
        let expected = MonthBucket::new(year, month_index)?;
        assert_eq!(bucket_in_zone(raw, &far_west)?, expected, "{raw} at UTC-12");
        assert_eq!(bucket_in_zone(raw, &far_east)?, expected, "{raw} at UTC+14");
        assert_eq!(bucket_in_zone(raw, &Utc)?, expected, "{raw} at UTC");
        assert_eq!(bucket_of(raw)?, expected, "{raw} in local zone");
    }
    Ok(())
}

#[test]
fn test_bucket_key_format() -> Result<()> {
    assert_eq!(MonthBucket::new(2024, 0)?.key(), "2024-0");
    assert_eq!(MonthBucket::new(2024, 11)?.key(), "2024-11");
    assert!(matches!(
        MonthBucket::new(2024, 12),
        Err(HistoryError::InvalidMonthIndex(12))
    ));
    Ok(())
}

#[test]
fn test_january_scenario() -> Result<()> {
    let records = sample_records();

    let filtered = filter_month(&records, january_2024())?;
    assert_eq!(ids(&filtered), vec![RecordId::Int(1), RecordId::Int(2)]);

    let totals = month_totals(&filtered);
    assert_eq!(totals.get("Chest Day"), Some(1));
    assert_eq!(totals.get("Leg Day Quads"), Some(1));
    assert_eq!(totals.get("Back Day"), None);
    assert_eq!(totals.grand_total, 2);
    assert_eq!(
        totals.iter().collect::<Vec<_>>(),
        vec![("Chest Day", 1), ("Leg Day Quads", 1)]
    );

    let index = month_activity_index(&records)?;
    assert!(index.contains_key("2024-0"));
    assert!(index.contains_key("2024-1"));
    assert!(!index.contains_key("2024-2"));
    assert_eq!(index.keys().collect::<Vec<_>>(), vec!["2024-0", "2024-1"]);
    Ok(())
}

#[test]
fn test_refilter_after_delete() -> Result<()> {
    let mut records = sample_records();
    records.retain(|r| r.id != RecordId::Int(2));

    let filtered = filter_month(&records, january_2024())?;
    assert_eq!(ids(&filtered), vec![RecordId::Int(1)]);

    let totals = month_totals(&filtered);
    assert_eq!(totals.iter().collect::<Vec<_>>(), vec![("Chest Day", 1)]);
    assert_eq!(totals.grand_total, 1);
    Ok(())
}

#[test]
fn test_malformed_record_is_reported_not_dropped() {
    let mut records = sample_records();
    records.push(record(4, "Chest Day", "2024-13-01"));

    let err = filter_month(&records, january_2024()).unwrap_err();
    match &err {
        HistoryError::InvalidRecordDate { id, .. } => assert_eq!(id, &RecordId::Int(4)),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.invalid_date(), Some("2024-13-01"));

    assert!(month_activity_index(&records).is_err());
    assert!(summarize_month(&records, january_2024()).is_err());
}

#[test]
fn test_filter_sorts_by_date_and_keeps_ties_in_order() -> Result<()> {
    let records = vec![
        record(10, "Back Day", "2024-03-20"),
        record(11, "Chest Day", "2024-03-02"),
        record(12, "Leg Day Quads", "2024-03-20"),
        record(13, "Shoulders Day", "2024-04-01"),
        record(14, "Chest Day", "2024-03-02"),
        record(15, "Back Day", "2023-03-02"),
    ];
    let filtered = filter_month(&records, MonthBucket::new(2024, 2)?)?;
    assert_eq!(
        ids(&filtered),
        vec![
            RecordId::Int(11),
            RecordId::Int(14),
            RecordId::Int(10),
            RecordId::Int(12)
        ]
    );
    Ok(())
}

#[test]
fn test_totals_keep_first_occurrence_order_and_unknown_types() -> Result<()> {
    let records = vec![
        record(1, "Leg Day Glutes", "2024-05-01"),
        record(2, "Chest Day", "2024-05-02"),
        record(3, "Leg Day Glutes", "2024-05-03"),
        record(4, "Yoga", "2024-05-04"),
        record(5, "Chest Day", "2024-05-05"),
    ];
    let filtered = filter_month(&records, MonthBucket::new(2024, 4)?)?;
    let totals = month_totals(&filtered);
    assert_eq!(
        totals.iter().collect::<Vec<_>>(),
        vec![("Leg Day Glutes", 2), ("Chest Day", 2), ("Yoga", 1)]
    );
    assert_eq!(totals.grand_total, 5);
    Ok(())
}

#[test]
fn test_empty_collection() -> Result<()> {
    let records: Vec<LocalRecord> = Vec::new();
    let summary = summarize_month(&records, january_2024())?;
    assert!(summary.records.is_empty());
    assert!(summary.totals.by_type.is_empty());
    assert_eq!(summary.totals.grand_total, 0);
    assert!(summary.activity.is_empty());
    Ok(())
}

#[test]
fn test_properties_over_generated_collection() -> Result<()> {
    let records = generated_records();
    let index = month_activity_index(&records)?;

    // Activity index is complete
    for r in &records {
        assert!(index.contains(bucket_of(&r.date)?), "missing bucket for {}", r.date);
    }
    // and idempotent
    assert_eq!(index, month_activity_index(&records)?);

    for year in 2021..=2025 {
        for month_index in 0..12 {
            let target = MonthBucket::new(year, month_index)?;
            let filtered = filter_month(&records, target)?;
            let totals = month_totals(&filtered);

            let sum: usize = totals.iter().map(|(_, count)| count).sum();
            assert_eq!(sum, filtered.len());
            assert_eq!(totals.grand_total, filtered.len());

            // Every filtered record is in the target month, in date order
            for r in &filtered {
                assert_eq!(bucket_of(r.date())?, target);
            }
            for pair in filtered.windows(2) {
                assert!(parse_record_date(pair[0].date())? <= parse_record_date(pair[1].date())?);
            }

            // Every record of the target month appears exactly once
            let expected = records
                .iter()
                .filter(|r| bucket_of(&r.date).map(|b| b == target).unwrap_or(false))
                .count();
            assert_eq!(filtered.len(), expected);
            for r in records.iter().filter(|r| bucket_of(&r.date).ok() == Some(target)) {
                assert_eq!(filtered.iter().filter(|f| f.id == r.id).count(), 1);
            }

            assert_eq!(index.contains(target), !filtered.is_empty());
        }
    }
    Ok(())
}

#[test]
fn test_mixed_record_variants() -> Result<()> {
    let records = vec![
        WorkoutRecord::Owned(OwnedRecord {
            id: RecordId::Text("a1".to_string()),
            workout_type: "Back Day".to_string(),
            date: "2024-06-03".to_string(),
            user_id: "user-1".to_string(),
        }),
        WorkoutRecord::Local(record(7, "Back Day", "2024-06-01")),
    ];
    let filtered = filter_month(&records, MonthBucket::new(2024, 5)?)?;
    assert_eq!(ids(&filtered), vec![RecordId::Int(7), RecordId::Text("a1".to_string())]);
    assert_eq!(filtered[1].user_id(), Some("user-1"));
    assert_eq!(month_totals(&filtered).get("Back Day"), Some(2));
    Ok(())
}

#[test]
fn test_month_cursor_navigation() -> Result<()> {
    let mut cursor = MonthCursor::new(2024, 0)?;
    assert_eq!(cursor.first_day(), "2024-01-01");

    cursor.change_month(2)?;
    assert_eq!(cursor.bucket(), MonthBucket::new(2024, 2)?);
    assert_eq!(cursor.first_day(), "2024-03-01");
    assert!(cursor.change_month(12).is_err());
    assert_eq!(cursor.month_index(), 2);

    cursor.change_year(-1);
    assert_eq!(cursor.bucket(), MonthBucket::new(2023, 2)?);
    cursor.change_year(2);
    assert_eq!(cursor.year(), 2025);

    let mut edge = MonthCursor::new(1, 0)?;
    edge.change_year(-5);
    assert_eq!(edge.year(), 1);
    edge.change_year(20_000);
    assert_eq!(edge.year(), 9999);

    let containing = MonthCursor::containing(NaiveDate::from_ymd_opt(2024, 7, 31).unwrap());
    assert_eq!(containing.bucket(), MonthBucket::new(2024, 6)?);
    Ok(())
}

#[test]
fn test_month_navigation_flags() -> Result<()> {
    let records = sample_records();
    let index = month_activity_index(&records)?;
    let cursor = MonthCursor::new(2024, 1)?;

    let nav = month_navigation(&cursor, &index);
    assert_eq!(nav.len(), 12);
    assert_eq!(nav[0].label, "JAN");
    assert_eq!(nav[11].label, "DEC");
    assert!(nav[0].has_activity && !nav[0].is_current);
    assert!(nav[1].has_activity && nav[1].is_current);
    assert!(nav[2..].iter().all(|e| !e.has_activity && !e.is_current));

    // Activity is per year
    let other_year = month_navigation(&MonthCursor::new(2023, 1)?, &index);
    assert!(other_year.iter().all(|e| !e.has_activity));
    Ok(())
}

#[test]
fn test_display_helpers() -> Result<()> {
    assert_eq!(display_date("2024-01-05")?, "Jan 5");
    assert_eq!(display_date("2024-12-25")?, "Dec 25");
    assert!(display_date("2024-12-32").is_err());
    assert_eq!(month_name(0), "January");
    assert_eq!(month_name(11), "December");
    assert_eq!(MonthBucket::new(2024, 2)?.to_string(), "March 2024");
    Ok(())
}
