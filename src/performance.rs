//! First-to-last percentage change, drawn as a chart overlay.

use crate::data::SeriesPoint;

pub const POSITIVE_COLOR: &str = "#16c784";
pub const NEGATIVE_COLOR: &str = "#ea3943";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    NonNegative,
    Negative,
}

impl Tone {
    pub fn color(&self) -> &'static str {
        match self {
            Tone::NonNegative => POSITIVE_COLOR,
            Tone::Negative => NEGATIVE_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceOverlay {
    pub change_pct: f64,
    pub tone: Tone,
}

impl PerformanceOverlay {
    pub fn text(&self) -> String {
        format!("Performance: {:+.2}%", self.change_pct)
    }
}

/// (last - first) / first * 100 by position. A single point is 0%; None for
/// an empty slice or a longer one starting at zero.
pub fn percent_change(slice: &[SeriesPoint]) -> Option<f64> {
    let first = slice.first()?;
    let last = slice.last()?;
    if slice.len() == 1 {
        return Some(0.0);
    }
    if first.value == 0.0 {
        return None;
    }
    Some((last.value - first.value) / first.value * 100.0)
}

pub fn annotate(slice: &[SeriesPoint]) -> Option<PerformanceOverlay> {
    percent_change(slice).map(|change_pct| PerformanceOverlay {
        change_pct,
        tone: if change_pct >= 0.0 {
            Tone::NonNegative
        } else {
            Tone::Negative
        },
    })
}
