use chrono::{Duration, NaiveDate, TimeZone, Utc};

use chainview::axis::{advise, Granularity, LabelFormat};
use chainview::data::ranges::RangeCatalog;
use chainview::data::SeriesPoint;
use chainview::filter::{apply, FilterState, TimeMode};

/// One point per day at 06:00 UTC from `start`, `days` long.
fn daily(start: (i32, u32, u32), days: i64) -> Vec<SeriesPoint> {
    let origin = Utc.with_ymd_and_hms(start.0, start.1, start.2, 6, 0, 0).unwrap();
    (0..days)
        .map(|i| SeriesPoint::new(origin + Duration::days(i), i as f64 + 1.0))
        .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn custom(a: NaiveDate, b: NaiveDate) -> FilterState {
    FilterState {
        time_mode: TimeMode::Custom,
        custom_start: Some(a),
        custom_end: Some(b),
        ..Default::default()
    }
}

#[test]
fn all_mode_is_identity() {
    let series = daily((2019, 1, 1), 900);
    assert_eq!(apply(&series, &FilterState::default()), series);
}

#[test]
fn swapped_custom_bounds_give_same_result() {
    let series = daily((2019, 1, 1), 900);
    let pairs = [
        (date(2019, 2, 1), date(2019, 3, 15)),
        (date(2020, 12, 31), date(2021, 1, 1)),
        (date(2018, 1, 1), date(2030, 1, 1)),
    ];
    for (a, b) in pairs {
        assert_eq!(apply(&series, &custom(a, b)), apply(&series, &custom(b, a)));
    }
}

#[test]
fn custom_window_keeps_both_edge_days() {
    let series = daily((2020, 1, 1), 60);
    let out = apply(&series, &custom(date(2020, 1, 10), date(2020, 1, 19)));
    assert_eq!(out.len(), 10);
    assert_eq!(out.first().unwrap().ts.date_naive(), date(2020, 1, 10));
    assert_eq!(out.last().unwrap().ts.date_naive(), date(2020, 1, 19));
}

#[test]
fn named_range_bounds_are_inclusive() {
    let range = RangeCatalog::resolve("cycle-1").unwrap();
    let start = range.start_ts();
    let end = range.end_ts().unwrap();
    let series = vec![
        SeriesPoint::new(start - Duration::seconds(1), 1.0),
        SeriesPoint::new(start, 2.0),
        SeriesPoint::new(end, 3.0),
        SeriesPoint::new(end + Duration::seconds(1), 4.0),
    ];
    let state = FilterState {
        time_mode: TimeMode::NamedRange,
        range_id: Some("cycle-1".to_string()),
        ..Default::default()
    };
    let kept: Vec<f64> = apply(&series, &state).iter().map(|p| p.value).collect();
    assert_eq!(kept, vec![2.0, 3.0]);
}

#[test]
fn window_without_points_is_empty_not_error() {
    let series = daily((2020, 1, 1), 10);
    let out = apply(&series, &custom(date(2022, 1, 1), date(2022, 2, 1)));
    assert!(out.is_empty());
    let advice = advise(&out, &custom(date(2022, 1, 1), date(2022, 2, 1)));
    assert_eq!(advice.label, LabelFormat::Default);
}

#[test]
fn custom_axis_follows_filtered_span() {
    let series = daily((2012, 1, 1), 365 * 10);
    let cases = [
        (date(2015, 1, 1), date(2015, 6, 30), Granularity::Month),
        (date(2015, 1, 1), date(2017, 6, 30), Granularity::Quarter),
        (date(2012, 1, 1), date(2020, 1, 1), Granularity::Year),
    ];
    for (a, b, expected) in cases {
        let state = custom(a, b);
        let visible = apply(&series, &state);
        assert_eq!(advise(&visible, &state).granularity, expected, "{} .. {}", a, b);
    }
}
