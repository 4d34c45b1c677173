use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One day of the study log after per-date aggregation: the summed hours
/// across all subjects studied on that date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub hours: f64,
}

/// A date-ordered series of daily records. Missing dates mean zero hours;
/// callers may materialize them with `data::fill_gaps` before analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudySeries {
    pub records: Vec<DailyRecord>,
}

impl StudySeries {
    pub fn new(records: Vec<DailyRecord>) -> Self {
        StudySeries { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_hours(&self) -> f64 {
        self.records.iter().map(|r| r.hours).sum()
    }

    /// Hours recorded on `date`, or None if the series has no entry for it.
    pub fn hours_on(&self, date: NaiveDate) -> Option<f64> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| self.records[i].hours)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AnalyticsError {
    #[error("study series contains no entries")]
    EmptySeries,
    #[error("invalid study series: {0}")]
    InvalidSeries(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StreakSummary {
    /// Longest run of consecutive days with hours > 0 anywhere in the series.
    pub longest_streak: u32,
    /// Run of consecutive studied days counting backward from today.
    /// Zero when today itself has no positive entry.
    pub current_streak: u32,
    pub distinct_study_days: usize,
    pub no_study_days: usize,
    /// Highest-hours day; first occurrence wins a tie.
    pub record: DailyRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolatilityPoint {
    pub date: NaiveDate,
    /// Sample standard deviation over the trailing window, None until the
    /// window is full.
    pub stdev: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyAverage {
    /// Monday of the ISO week.
    pub week_start: NaiveDate,
    pub avg_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayAverage {
    pub weekday: String,
    pub avg_hours: f64,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Pure analytics over a StudySeries. Holds no state; every method reads
/// the series it is given and nothing else.
pub struct SeriesAnalyzer;

impl SeriesAnalyzer {
    pub fn new() -> Self {
        SeriesAnalyzer
    }

    /// Dates must be strictly ascending: duplicates and unsorted input are
    /// precondition violations for the streak and volatility scans.
    fn check_series(&self, series: &StudySeries) -> Result<(), AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptySeries);
        }
        for pair in series.records.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(AnalyticsError::InvalidSeries(format!(
                    "duplicate or out-of-order date {}",
                    pair[1].date
                )));
            }
        }
        Ok(())
    }

    /// Per-date totals as given by the caller. Aggregation already happened
    /// upstream, so this passes entries through without touching the gaps.
    pub fn daily_totals(&self, series: &StudySeries) -> Result<StudySeries, AnalyticsError> {
        if series.is_empty() {
            return Err(AnalyticsError::EmptySeries);
        }
        Ok(series.clone())
    }

    /// Sample standard deviation of hours over the trailing `window` entries
    /// (entries, not calendar days - gaps shift the window). The first
    /// `window - 1` points carry no value.
    pub fn rolling_volatility(
        &self,
        series: &StudySeries,
        window: usize,
    ) -> Result<Vec<VolatilityPoint>, AnalyticsError> {
        self.check_series(series)?;
        if window < 2 {
            return Err(AnalyticsError::InvalidSeries(format!(
                "volatility window must be at least 2, got {}",
                window
            )));
        }

        let points = series
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let stdev = if i + 1 >= window {
                    let slice = &series.records[i + 1 - window..=i];
                    Some(sample_stdev(slice))
                } else {
                    None
                };
                VolatilityPoint {
                    date: record.date,
                    stdev,
                }
            })
            .collect();

        Ok(points)
    }

    /// Mean hours per ISO week (weeks start Monday). Weeks with no entries
    /// are absent from the output; an empty series yields an empty vec.
    pub fn weekly_average(&self, series: &StudySeries) -> Vec<WeeklyAverage> {
        let mut weeks: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for record in &series.records {
            let monday = record.date
                - chrono::Duration::days(record.date.weekday().num_days_from_monday() as i64);
            let slot = weeks.entry(monday).or_insert((0.0, 0));
            slot.0 += record.hours;
            slot.1 += 1;
        }

        weeks
            .into_iter()
            .map(|(week_start, (sum, count))| WeeklyAverage {
                week_start,
                avg_hours: sum / count as f64,
            })
            .collect()
    }

    /// Streak and attendance counts as of `today`.
    ///
    /// A day qualifies when hours > 0. A calendar gap between successive
    /// entries breaks a streak exactly as an explicit zero-hour entry does,
    /// so a gapped series and its zero-filled form agree on every count.
    /// The current streak walks backward from `today` while each day has a
    /// positive entry; it is 0 when today has none, and the series start
    /// bounds the walk.
    pub fn streak_summary(
        &self,
        series: &StudySeries,
        today: NaiveDate,
    ) -> Result<StreakSummary, AnalyticsError> {
        self.check_series(series)?;

        let mut longest: u32 = 0;
        let mut run: u32 = 0;
        let mut prev_date: Option<NaiveDate> = None;
        for record in &series.records {
            if record.hours > 0.0 {
                let adjacent = prev_date
                    .map(|p| (record.date - p).num_days() == 1)
                    .unwrap_or(false);
                run = if adjacent { run + 1 } else { 1 };
                longest = longest.max(run);
            } else {
                run = 0;
            }
            prev_date = Some(record.date);
        }

        let mut current: u32 = 0;
        let mut day = today;
        while matches!(series.hours_on(day), Some(h) if h > 0.0) {
            current += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }

        let mut record = series.records[0];
        for candidate in &series.records[1..] {
            if candidate.hours > record.hours {
                record = *candidate;
            }
        }

        Ok(StreakSummary {
            longest_streak: longest,
            current_streak: current,
            distinct_study_days: series.records.iter().filter(|r| r.hours > 0.0).count(),
            no_study_days: series.records.iter().filter(|r| r.hours == 0.0).count(),
            record,
        })
    }

    /// Mean hours per calendar weekday across the whole series, ordered
    /// Monday through Sunday. Weekdays with no entries are absent.
    pub fn weekday_profile(&self, series: &StudySeries) -> Vec<WeekdayAverage> {
        let mut sums = [0.0f64; 7];
        let mut counts = [0usize; 7];
        for record in &series.records {
            let idx = record.date.weekday().num_days_from_monday() as usize;
            sums[idx] += record.hours;
            counts[idx] += 1;
        }

        let order = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        order
            .iter()
            .enumerate()
            .filter(|&(idx, _)| counts[idx] > 0)
            .map(|(idx, &weekday)| WeekdayAverage {
                weekday: weekday_name(weekday).to_string(),
                avg_hours: sums[idx] / counts[idx] as f64,
            })
            .collect()
    }
}

fn sample_stdev(records: &[DailyRecord]) -> f64 {
    let n = records.len() as f64;
    let mean = records.iter().map(|r| r.hours).sum::<f64>() / n;
    let sum_sq: f64 = records.iter().map(|r| (r.hours - mean).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}
