//! Time-window filtering of a loaded series.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::data::ranges::RangeCatalog;
use crate::data::{start_of_day, SeriesPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeMode {
    #[default]
    All,
    Year,
    NamedRange,
    Custom,
}

impl TimeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "all" => Some(TimeMode::All),
            "year" => Some(TimeMode::Year),
            "range" | "namedRange" | "named_range" => Some(TimeMode::NamedRange),
            "custom" => Some(TimeMode::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMode::All => "all",
            TimeMode::Year => "year",
            TimeMode::NamedRange => "range",
            TimeMode::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisTransform {
    #[default]
    Linear,
    Logarithmic,
}

impl AxisTransform {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "linear" | "false" => Some(AxisTransform::Linear),
            "log" | "logarithmic" | "true" => Some(AxisTransform::Logarithmic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AxisTransform::Linear => "linear",
            AxisTransform::Logarithmic => "logarithmic",
        }
    }
}

/// Per-asset filter selection. Only the field selected by `time_mode` is
/// consulted; the others keep their last value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub time_mode: TimeMode,
    pub year: Option<i32>,
    pub range_id: Option<String>,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
    pub axis_transform: AxisTransform,
}

/// Last representable instant of `date` (millisecond resolution).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| start_of_day(date))
}

/// The inclusive [start, end] window of a complete custom selection, with the
/// bounds swapped into order and the end widened to the close of its day.
pub fn custom_window(state: &FilterState) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (a, b) = (state.custom_start?, state.custom_end?);
    let (lo, hi) = if a > b { (b, a) } else { (a, b) };
    Some((start_of_day(lo), end_of_day(hi)))
}

/// Returns the visible subsequence for `state`. Never reorders; unset or
/// unresolvable selectors fall back to the whole series.
pub fn apply(series: &[SeriesPoint], state: &FilterState) -> Vec<SeriesPoint> {
    match state.time_mode {
        TimeMode::All => series.to_vec(),
        TimeMode::Year => match state.year {
            Some(year) => keep(series, |p| p.ts.year() == year),
            None => series.to_vec(),
        },
        TimeMode::NamedRange => match state.range_id.as_deref().and_then(RangeCatalog::resolve) {
            Some(range) => keep(series, |p| range.contains(p.ts)),
            None => series.to_vec(),
        },
        TimeMode::Custom => match custom_window(state) {
            Some((start, end)) => keep(series, |p| p.ts >= start && p.ts <= end),
            None => series.to_vec(),
        },
    }
}

fn keep<F>(series: &[SeriesPoint], pred: F) -> Vec<SeriesPoint>
where
    F: Fn(&SeriesPoint) -> bool,
{
    series.iter().filter(|p| pred(p)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pt(y: i32, m: u32, d: u32, h: u32, v: f64) -> SeriesPoint {
        SeriesPoint::new(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(), v)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<SeriesPoint> {
        vec![
            pt(2019, 12, 31, 0, 1.0),
            pt(2020, 3, 1, 0, 2.0),
            pt(2020, 5, 11, 0, 3.0),
            pt(2020, 5, 11, 18, 4.0),
            pt(2021, 1, 1, 0, 5.0),
        ]
    }

    #[test]
    fn test_year_keeps_calendar_year() {
        let state = FilterState {
            time_mode: TimeMode::Year,
            year: Some(2020),
            ..Default::default()
        };
        let out = apply(&sample(), &state);
        assert_eq!(out.iter().map(|p| p.value).collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unset_selectors_are_identity() {
        let series = sample();
        for mode in [TimeMode::All, TimeMode::Year, TimeMode::NamedRange, TimeMode::Custom] {
            let state = FilterState {
                time_mode: mode,
                custom_start: Some(date(2020, 1, 1)),
                ..Default::default()
            };
            assert_eq!(apply(&series, &state), series, "mode {:?}", mode);
        }
    }

    #[test]
    fn test_unknown_range_is_identity() {
        let state = FilterState {
            time_mode: TimeMode::NamedRange,
            range_id: Some("cycle-99".into()),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &state), sample());
    }

    #[test]
    fn test_named_range_includes_start_boundary() {
        let state = FilterState {
            time_mode: TimeMode::NamedRange,
            range_id: Some("cycle-3".into()),
            ..Default::default()
        };
        let out = apply(&sample(), &state);
        assert_eq!(out.first().unwrap().value, 3.0);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_custom_single_day_is_whole_day() {
        let state = FilterState {
            time_mode: TimeMode::Custom,
            custom_start: Some(date(2020, 5, 11)),
            custom_end: Some(date(2020, 5, 11)),
            ..Default::default()
        };
        assert_eq!(apply(&sample(), &state).len(), 2);
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let state = FilterState {
            time_mode: TimeMode::Year,
            year: Some(2020),
            ..Default::default()
        };
        assert!(apply(&[], &state).is_empty());
        assert!(apply(&[], &FilterState::default()).is_empty());
    }

    #[test]
    fn test_mode_and_scale_parsing() {
        assert_eq!(TimeMode::parse("range"), Some(TimeMode::NamedRange));
        assert_eq!(TimeMode::parse("weekly"), None);
        assert_eq!(AxisTransform::parse("log"), Some(AxisTransform::Logarithmic));
        assert_eq!(AxisTransform::parse("linear"), Some(AxisTransform::Linear));
    }
}
