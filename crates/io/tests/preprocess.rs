//! Raw county-level CSV to per-state daily series.

use epitrend_calendar::NaiveDate;
use epitrend_io::{RawColumns, SeriesWindow, build_region_series, read_raw_table};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
}

fn series_from(csv: &str, window: SeriesWindow) -> Vec<epitrend_io::RegionSeries> {
    let records = read_raw_table(csv.as_bytes(), &RawColumns::default()).unwrap();
    build_region_series(&records, &window).unwrap()
}

#[test]
fn counties_aggregate_to_state() {
    let csv = "\
date,county,state,cases
2020-03-01,King,Washington,2
2020-03-01,Pierce,Washington,1
2020-03-02,King,Washington,4
2020-03-02,Pierce,Washington,3
";
    let series = series_from(csv, SeriesWindow::default());
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].region_id(), "Washington");
    assert_eq!(series[0].new_cases(), &[3.0, 4.0]);
}

#[test]
fn regions_sorted_and_share_window() {
    let csv = "\
date,state,cases
2020-03-02,Texas,5
2020-03-01,Alaska,1
2020-03-03,Alaska,4
";
    let series = series_from(csv, SeriesWindow::default());
    let ids: Vec<_> = series.iter().map(|s| s.region_id()).collect();
    assert_eq!(ids, vec!["Alaska", "Texas"]);
    for s in &series {
        assert_eq!(s.start(), day(1));
        assert_eq!(s.end(), day(3));
    }
    // Texas: cumulative 0, 5, 0 -> deltas 0, 5, (negative -> filled with last valid 5)
    assert_eq!(series[1].new_cases(), &[0.0, 5.0, 5.0]);
}

#[test]
fn missing_days_count_as_zero_cumulative() {
    // Alaska has no row on 03-02; the zero there makes a negative delta.
    let csv = "\
date,state,cases
2020-03-01,Alaska,1
2020-03-03,Alaska,4
";
    let series = series_from(csv, SeriesWindow::default());
    // cumulative 1, 0, 4 -> deltas 1, missing, 4 -> interior fill 2.5
    assert_eq!(series[0].new_cases(), &[1.0, 2.5, 4.0]);
}

#[test]
fn epoch_uses_day_before_from_raw_data() {
    let csv = "\
date,state,cases
2020-02-28,Ohio,3
2020-02-29,Ohio,7
2020-03-01,Ohio,10
2020-03-02,Ohio,16
";
    let series = series_from(csv, SeriesWindow::default());
    assert_eq!(series[0].start(), day(1));
    assert_eq!(series[0].new_cases(), &[3.0, 6.0]);
}

#[test]
fn leading_and_trailing_corrections() {
    let csv = "\
date,state,cases
2020-02-29,Utah,10
2020-03-01,Utah,8
2020-03-02,Utah,12
2020-03-03,Utah,15
2020-03-04,Utah,11
";
    let series = series_from(csv, SeriesWindow::default());
    // deltas: -2 (lead), 4, 3, -4 (trail)
    assert_eq!(series[0].new_cases(), &[4.0, 4.0, 3.0, 3.0]);
}

#[test]
fn explicit_end_extends_with_zero_cumulative() {
    let csv = "\
date,state,cases
2020-03-01,Iowa,2
2020-03-02,Iowa,5
";
    let window = SeriesWindow::default().with_end(Some(day(3)));
    let series = series_from(csv, window);
    // cumulative 2, 5, 0 -> deltas 2, 3, missing -> trailing fill 3
    assert_eq!(series[0].new_cases(), &[2.0, 3.0, 3.0]);
}

#[test]
fn one_region_does_not_affect_another() {
    let csv = "\
date,state,cases
2020-03-01,A,1
2020-03-02,A,0
2020-03-01,B,1
2020-03-02,B,2
";
    let series = series_from(csv, SeriesWindow::default());
    assert_eq!(series[0].new_cases(), &[1.0, 1.0]);
    assert_eq!(series[1].new_cases(), &[1.0, 1.0]);
}

#[test]
fn all_negative_region_is_zero() {
    let csv = "\
date,state,cases
2020-02-29,Maine,9
2020-03-01,Maine,5
2020-03-02,Maine,1
";
    let series = series_from(csv, SeriesWindow::default());
    assert_eq!(series[0].new_cases(), &[0.0, 0.0]);
    assert!(series[0].is_degenerate());
}
