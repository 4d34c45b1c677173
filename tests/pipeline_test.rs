use chrono::NaiveDate;
use study_tracker::analytics::SeriesAnalyzer;
use study_tracker::data;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn write_temp_log(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{}_{}.csv", name, std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn csv_to_streak_summary_pipeline() {
    // Two subjects on day 1, a gap on day 3, bad rows that must be dropped.
    let path = write_temp_log(
        "study_tracker_pipeline",
        "Study,Hours,Full_Date\n\
         Math,2.0,2024-03-01\n\
         Physics,1.5,2024-03-01\n\
         Math,3.0,02/03/2024\n\
         History,n/a,2024-03-02\n\
         Math,oops,not-a-date\n\
         Math,2.0,2024-03-04\n\
         Math,2.5,2024-03-05\n",
    );
    let rows = data::load_rows(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 5);

    let series = data::aggregate_daily(&rows);
    assert_eq!(series.len(), 4);
    assert_eq!(series.hours_on(d(1)), Some(3.5));

    let analyzer = SeriesAnalyzer::new();
    let summary = analyzer.streak_summary(&series, d(5)).unwrap();
    // Days 1-2 studied, day 3 missing breaks the run, days 4-5 trail into today.
    assert_eq!(summary.longest_streak, 2);
    assert_eq!(summary.current_streak, 2);
    assert_eq!(summary.distinct_study_days, 4);
    assert_eq!(summary.record.date, d(1));
}

#[test]
fn gap_filled_series_matches_gapped_analysis() {
    let path = write_temp_log(
        "study_tracker_gaps",
        "Study,Hours,Full_Date\n\
         Math,2.0,2024-03-01\n\
         Math,2.0,2024-03-02\n\
         Math,2.0,2024-03-05\n",
    );
    let rows = data::load_rows(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let series = data::aggregate_daily(&rows);
    let filled = data::fill_gaps(&series);
    assert_eq!(filled.len(), 5);

    let analyzer = SeriesAnalyzer::new();
    let gapped = analyzer.streak_summary(&series, d(5)).unwrap();
    let explicit = analyzer.streak_summary(&filled, d(5)).unwrap();
    assert_eq!(gapped.longest_streak, explicit.longest_streak);
    assert_eq!(gapped.current_streak, explicit.current_streak);
    assert_eq!(gapped.distinct_study_days, explicit.distinct_study_days);
}

#[test]
fn append_and_snapshot_round_trip() {
    let path = write_temp_log(
        "study_tracker_append",
        "Study,Hours,Full_Date\n\
         Math,2.0,2024-03-01\n",
    );
    let mut rows = data::load_rows(&path).unwrap();

    rows.push(data::SubjectEntry {
        subject: "Physics".to_string(),
        date: d(2),
        hours: 1.25,
    });
    data::write_snapshot(&path, &rows).unwrap();

    let reloaded = data::load_rows(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[1].subject, "Physics");
    assert_eq!(reloaded[1].date, d(2));
    assert!((reloaded[1].hours - 1.25).abs() < 1e-9);
}

#[test]
fn volatility_and_weekly_views_from_one_log() {
    let mut csv = String::from("Study,Hours,Full_Date\n");
    // 2024-03-04 is a Monday; fourteen consecutive days of alternating hours.
    for day in 4..18 {
        csv.push_str(&format!("Math,{},2024-03-{:02}\n", if day % 2 == 0 { 2.0 } else { 4.0 }, day));
    }
    let path = write_temp_log("study_tracker_views", &csv);
    let rows = data::load_rows(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let series = data::aggregate_daily(&rows);
    let analyzer = SeriesAnalyzer::new();

    let points = analyzer.rolling_volatility(&series, 7).unwrap();
    assert_eq!(points.len(), 14);
    assert!(points[..6].iter().all(|p| p.stdev.is_none()));
    assert!(points[6..].iter().all(|p| p.stdev.is_some()));

    let weeks = analyzer.weekly_average(&series);
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0].week_start, d(4));
    assert_eq!(weeks[1].week_start, d(11));
    for week in &weeks {
        assert!(week.avg_hours >= 2.0 && week.avg_hours <= 4.0);
    }

    let profile = analyzer.weekday_profile(&series);
    assert_eq!(profile.len(), 7);
    assert_eq!(profile[0].weekday, "Monday");
    assert_eq!(profile[6].weekday, "Sunday");
}
