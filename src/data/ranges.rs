//! Named historical windows (bitcoin halving cycles).

use chrono::{DateTime, NaiveDate, Utc};

use super::start_of_day;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEntry {
    pub id: &'static str,
    pub label: &'static str,
    /// (year, month, day), inclusive
    pub start: (i32, u32, u32),
    /// None = open, runs to the latest data
    pub end: Option<(i32, u32, u32)>,
}

impl RangeEntry {
    pub fn start_ts(&self) -> DateTime<Utc> {
        ymd_ts(self.start)
    }

    pub fn end_ts(&self) -> Option<DateTime<Utc>> {
        self.end.map(ymd_ts)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start_ts() && self.end_ts().map_or(true, |end| ts <= end)
    }
}

fn ymd_ts((y, m, d): (i32, u32, u32)) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .map(start_of_day)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub const HALVING_CYCLES: &[RangeEntry] = &[
    RangeEntry {
        id: "genesis",
        label: "Genesis to 1st halving",
        start: (2009, 1, 3),
        end: Some((2012, 11, 27)),
    },
    RangeEntry {
        id: "cycle-1",
        label: "Cycle 1 (2012-2016)",
        start: (2012, 11, 28),
        end: Some((2016, 7, 8)),
    },
    RangeEntry {
        id: "cycle-2",
        label: "Cycle 2 (2016-2020)",
        start: (2016, 7, 9),
        end: Some((2020, 5, 10)),
    },
    RangeEntry {
        id: "cycle-3",
        label: "Cycle 3 (2020-2024)",
        start: (2020, 5, 11),
        end: Some((2024, 4, 19)),
    },
    RangeEntry {
        id: "cycle-4",
        label: "Cycle 4 (2024-)",
        start: (2024, 4, 20),
        end: None,
    },
];

pub struct RangeCatalog;

impl RangeCatalog {
    pub fn resolve(id: &str) -> Option<&'static RangeEntry> {
        HALVING_CYCLES.iter().find(|r| r.id == id)
    }

    pub fn entries() -> &'static [RangeEntry] {
        HALVING_CYCLES
    }
}
