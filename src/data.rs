use crate::analytics::{DailyRecord, StudySeries};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read study log: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write study log: {0}")]
    Io(#[from] std::io::Error),
}

/// One subject-level row of the study log, as stored in the CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub subject: String,
    pub date: NaiveDate,
    pub hours: f64,
}

/// Raw CSV shape. The log has carried these header names since the
/// spreadsheet days, so they stay.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Study")]
    subject: String,
    #[serde(rename = "Hours")]
    hours: String,
    #[serde(rename = "Full_Date")]
    date: String,
}

/// The log has dates in both ISO and day-first form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

/// Loads subject rows from the CSV log. Rows with unparseable dates or
/// hours are dropped with a warning rather than failing the whole load.
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<SubjectEntry>, DataError> {
    let mut rdr = Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        let raw = result?;
        let Some(date) = parse_date(&raw.date) else {
            log::warn!("skipping row with unparseable date {:?}", raw.date);
            continue;
        };
        let Ok(hours) = raw.hours.trim().parse::<f64>() else {
            log::warn!("skipping row with non-numeric hours {:?}", raw.hours);
            continue;
        };
        if hours < 0.0 {
            log::warn!("skipping row with negative hours {}", hours);
            continue;
        }
        rows.push(SubjectEntry {
            subject: raw.subject.trim().to_string(),
            date,
            hours,
        });
    }

    Ok(rows)
}

/// Sums all subject rows per date into a date-ordered series. This is the
/// caller-side aggregation the analytics engine expects: after it, every
/// date appears at most once.
pub fn aggregate_daily(rows: &[SubjectEntry]) -> StudySeries {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.date).or_insert(0.0) += row.hours;
    }

    StudySeries::new(
        totals
            .into_iter()
            .map(|(date, hours)| DailyRecord { date, hours })
            .collect(),
    )
}

/// Materializes explicit zero-hour records for every missing date between
/// the first and last entry.
pub fn fill_gaps(series: &StudySeries) -> StudySeries {
    let Some(first) = series.records.first() else {
        return StudySeries::default();
    };
    let last = series.records[series.records.len() - 1];

    let mut filled = Vec::new();
    let mut day = first.date;
    while day <= last.date {
        filled.push(DailyRecord {
            date: day,
            hours: series.hours_on(day).unwrap_or(0.0),
        });
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    StudySeries::new(filled)
}

/// Per-subject hour totals over rows dated on or after `since`, highest
/// first. Backs the "top subjects" cards on the dashboard.
pub fn top_subjects(rows: &[SubjectEntry], since: NaiveDate, limit: usize) -> Vec<(String, f64)> {
    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in rows.iter().filter(|r| r.date >= since) {
        *totals.entry(row.subject.clone()).or_insert(0.0) += row.hours;
    }

    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// Writes the full row set back to the CSV log as a single replacement
/// snapshot, same header the loader reads.
pub fn write_snapshot<P: AsRef<Path>>(path: P, rows: &[SubjectEntry]) -> Result<(), DataError> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["Study", "Hours", "Full_Date"])?;
    for row in rows {
        wtr.write_record([
            row.subject.as_str(),
            &row.hours.to_string(),
            &row.date.format("%Y-%m-%d").to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn entry(subject: &str, day: u32, hours: f64) -> SubjectEntry {
        SubjectEntry {
            subject: subject.to_string(),
            date: d(day),
            hours,
        }
    }

    #[test]
    fn parse_date_accepts_both_forms() {
        assert_eq!(parse_date("2024-03-05"), Some(d(5)));
        assert_eq!(parse_date("05/03/2024"), Some(d(5)));
        assert_eq!(parse_date("March 5th"), None);
    }

    #[test]
    fn aggregate_sums_subject_rows_per_date() {
        let rows = vec![
            entry("Math", 1, 2.0),
            entry("Physics", 1, 1.5),
            entry("Math", 2, 3.0),
        ];
        let series = aggregate_daily(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series.hours_on(d(1)), Some(3.5));
        assert_eq!(series.hours_on(d(2)), Some(3.0));
    }

    #[test]
    fn aggregate_preserves_total_hours() {
        let rows = vec![
            entry("Math", 1, 2.0),
            entry("Physics", 1, 1.5),
            entry("History", 3, 0.5),
        ];
        let raw_total: f64 = rows.iter().map(|r| r.hours).sum();
        let series = aggregate_daily(&rows);
        assert!((series.total_hours() - raw_total).abs() < 1e-9);
    }

    #[test]
    fn aggregate_sorts_out_of_order_rows() {
        let rows = vec![entry("Math", 5, 1.0), entry("Math", 2, 1.0)];
        let series = aggregate_daily(&rows);
        assert_eq!(series.records[0].date, d(2));
        assert_eq!(series.records[1].date, d(5));
    }

    #[test]
    fn fill_gaps_inserts_zero_days() {
        let series = aggregate_daily(&[entry("Math", 1, 2.0), entry("Math", 4, 1.0)]);
        let filled = fill_gaps(&series);
        assert_eq!(filled.len(), 4);
        assert_eq!(filled.hours_on(d(2)), Some(0.0));
        assert_eq!(filled.hours_on(d(3)), Some(0.0));
        assert!((filled.total_hours() - series.total_hours()).abs() < 1e-9);
    }

    #[test]
    fn top_subjects_ranks_and_filters_by_date() {
        let rows = vec![
            entry("Math", 1, 10.0),
            entry("Math", 10, 1.0),
            entry("Physics", 10, 4.0),
            entry("History", 12, 2.0),
        ];
        let top = top_subjects(&rows, d(10), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "Physics");
        assert_eq!(top[1].0, "History");
    }

    #[test]
    fn snapshot_round_trips_through_csv() {
        let path = std::env::temp_dir().join(format!(
            "study_tracker_snapshot_{}.csv",
            std::process::id()
        ));
        let rows = vec![entry("Math", 1, 2.5), entry("Physics", 2, 1.0)];
        write_snapshot(&path, &rows).unwrap();
        let loaded = load_rows(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].subject, "Math");
        assert_eq!(loaded[0].date, d(1));
        assert!((loaded[0].hours - 2.5).abs() < 1e-9);
    }
}
