//! Adaptive time-axis policy: tick granularity and label format chosen from
//! the time mode and, for custom windows, the span of the filtered data.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::data::SeriesPoint;
use crate::filter::{FilterState, TimeMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Month,
    Quarter,
    Year,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Month => "month",
            Granularity::Quarter => "quarter",
            Granularity::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelFormat {
    /// Renderer's own formatting
    Default,
    /// `Q1 2024`
    QuarterYear,
    /// `Q1 '24`
    QuarterShortYear,
    /// `Jan`
    Month,
    /// `Jan 24`
    MonthShortYear,
    /// `2024`
    Year,
}

impl LabelFormat {
    pub fn label(&self, ts: DateTime<Utc>) -> Option<String> {
        let quarter = (ts.month0() / 3) + 1;
        match self {
            LabelFormat::Default => None,
            LabelFormat::QuarterYear => Some(format!("Q{} {}", quarter, ts.year())),
            LabelFormat::QuarterShortYear => Some(format!("Q{} '{}", quarter, ts.format("%y"))),
            LabelFormat::Month => Some(ts.format("%b").to_string()),
            LabelFormat::MonthShortYear => Some(ts.format("%b %y").to_string()),
            LabelFormat::Year => Some(ts.year().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisAdvice {
    pub granularity: Granularity,
    pub label: LabelFormat,
}

impl AxisAdvice {
    pub const fn new(granularity: Granularity, label: LabelFormat) -> Self {
        Self { granularity, label }
    }
}

const DAYS_PER_YEAR: i64 = 365;

pub fn advise(filtered: &[SeriesPoint], state: &FilterState) -> AxisAdvice {
    let (first, last) = match (filtered.first(), filtered.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => return AxisAdvice::new(Granularity::Month, LabelFormat::Default),
    };
    match state.time_mode {
        TimeMode::All => AxisAdvice::new(Granularity::Quarter, LabelFormat::QuarterYear),
        TimeMode::Year => AxisAdvice::new(Granularity::Month, LabelFormat::Month),
        TimeMode::NamedRange => AxisAdvice::new(Granularity::Month, LabelFormat::MonthShortYear),
        TimeMode::Custom => {
            let span = last.ts - first.ts;
            if span < Duration::days(DAYS_PER_YEAR) {
                AxisAdvice::new(Granularity::Month, LabelFormat::Month)
            } else if span < Duration::days(DAYS_PER_YEAR * 5) {
                AxisAdvice::new(Granularity::Quarter, LabelFormat::QuarterShortYear)
            } else {
                AxisAdvice::new(Granularity::Year, LabelFormat::Year)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn span(from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<SeriesPoint> {
        vec![SeriesPoint::new(from, 1.0), SeriesPoint::new(to, 2.0)]
    }

    fn custom() -> FilterState {
        FilterState {
            time_mode: TimeMode::Custom,
            ..Default::default()
        }
    }

    #[test]
    fn test_fixed_modes() {
        let data = span(ts(2020, 1, 1), ts(2020, 2, 1));
        let mut state = FilterState::default();
        assert_eq!(advise(&data, &state).granularity, Granularity::Quarter);
        state.time_mode = TimeMode::Year;
        assert_eq!(advise(&data, &state).label, LabelFormat::Month);
        state.time_mode = TimeMode::NamedRange;
        assert_eq!(advise(&data, &state).label, LabelFormat::MonthShortYear);
    }

    #[test]
    fn test_custom_span_thresholds() {
        let short = span(ts(2020, 1, 1), ts(2020, 6, 1));
        let mid = span(ts(2020, 1, 1), ts(2022, 1, 1));
        let long = span(ts(2015, 1, 1), ts(2022, 1, 1));
        assert_eq!(advise(&short, &custom()).granularity, Granularity::Month);
        assert_eq!(advise(&mid, &custom()).granularity, Granularity::Quarter);
        assert_eq!(advise(&long, &custom()).granularity, Granularity::Year);
        // exactly one 365-day year flips to quarters
        let one_year = span(ts(2021, 1, 1), ts(2022, 1, 1));
        assert_eq!(advise(&one_year, &custom()).label, LabelFormat::QuarterShortYear);
        // exactly five 365-day years flips to years; a day less stays quarterly
        let five_years = span(ts(2015, 1, 1), ts(2015, 1, 1) + Duration::days(5 * 365));
        assert_eq!(advise(&five_years, &custom()).label, LabelFormat::Year);
        let almost = span(ts(2015, 1, 1), ts(2015, 1, 1) + Duration::days(5 * 365 - 1));
        assert_eq!(advise(&almost, &custom()).granularity, Granularity::Quarter);
    }

    #[test]
    fn test_no_data_uses_default_labels() {
        let advice = advise(&[], &FilterState::default());
        assert_eq!(advice, AxisAdvice::new(Granularity::Month, LabelFormat::Default));
    }

    #[test]
    fn test_label_text() {
        let t = ts(2024, 5, 20);
        assert_eq!(LabelFormat::QuarterYear.label(t).unwrap(), "Q2 2024");
        assert_eq!(LabelFormat::QuarterShortYear.label(t).unwrap(), "Q2 '24");
        assert_eq!(LabelFormat::Month.label(t).unwrap(), "May");
        assert_eq!(LabelFormat::MonthShortYear.label(t).unwrap(), "May 24");
        assert_eq!(LabelFormat::Year.label(t).unwrap(), "2024");
        assert_eq!(LabelFormat::Default.label(t), None);
    }
}
