//! Path <-> navigation triple table.

use std::collections::HashMap;

pub mod view;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub path: &'static str,
    pub tab: &'static str,
    pub subtab: Option<&'static str>,
    pub subsubtab: Option<&'static str>,
}

impl RouteEntry {
    const fn new(
        path: &'static str,
        tab: &'static str,
        subtab: Option<&'static str>,
        subsubtab: Option<&'static str>,
    ) -> Self {
        Self { path, tab, subtab, subsubtab }
    }

    pub fn matches(&self, tab: &str, subtab: Option<&str>, subsubtab: Option<&str>) -> bool {
        self.tab == tab && self.subtab == subtab && self.subsubtab == subsubtab
    }
}

pub const ROUTES: &[RouteEntry] = &[
    RouteEntry::new("overview", "overview", None, None),
    RouteEntry::new("metrics", "metrics", None, None),
    RouteEntry::new("metrics/tx-amount", "metrics", Some("METRICS_BTC_TX_AMOUNT"), None),
    RouteEntry::new("metrics/tx-amount/24h", "metrics", Some("METRICS_BTC_TX_AMOUNT"), Some("METRICS_BTC_TX_AMOUNT_24H")),
    RouteEntry::new("metrics/tx-amount/7d", "metrics", Some("METRICS_BTC_TX_AMOUNT"), Some("METRICS_BTC_TX_AMOUNT_7D")),
    RouteEntry::new("metrics/tx-amount/all-time", "metrics", Some("METRICS_BTC_TX_AMOUNT"), Some("METRICS_BTC_TX_AMOUNT_ALL_TIME")),
    RouteEntry::new("metrics/fees", "metrics", Some("METRICS_BTC_FEES"), None),
    RouteEntry::new("metrics/fees/24h", "metrics", Some("METRICS_BTC_FEES"), Some("METRICS_BTC_FEES_24H")),
    RouteEntry::new("metrics/fees/7d", "metrics", Some("METRICS_BTC_FEES"), Some("METRICS_BTC_FEES_7D")),
    RouteEntry::new("review", "review", None, None),
    RouteEntry::new("review/btc-usd", "review", Some("REVIEW_BTC_USD"), None),
    RouteEntry::new("review/btc-eur", "review", Some("REVIEW_BTC_EUR"), None),
    RouteEntry::new("review/btc-gold", "review", Some("REVIEW_BTC_GOLD"), None),
    RouteEntry::new("explorer", "explorer", None, None),
    RouteEntry::new("explorer/blocks", "explorer", Some("EXPLORER_BLOCKS"), None),
    RouteEntry::new("explorer/transactions", "explorer", Some("EXPLORER_TRANSACTIONS"), None),
    RouteEntry::new("explorer/addresses", "explorer", Some("EXPLORER_ADDRESSES"), None),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
    #[error("route path {path:?} is not canonical")]
    NonCanonicalPath { path: String },
    #[error("route path {path:?} appears twice")]
    DuplicatePath { path: String },
    #[error("routes {first:?} and {second:?} map to the same view")]
    DuplicateTriple { first: String, second: String },
}

/// Strips surrounding separators: `/metrics/fees/` -> `metrics/fees`.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn is_canonical(path: &str) -> bool {
    !path.is_empty() && normalize(path) == path && !path.split('/').any(str::is_empty)
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    by_path: HashMap<&'static str, usize>,
}

impl RouteTable {
    /// Rejects non-canonical paths, repeated paths, and two paths sharing one
    /// triple (which would make reverse lookup ambiguous).
    pub fn new(entries: &[RouteEntry]) -> Result<Self, RouteTableError> {
        let mut by_path = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if !is_canonical(entry.path) {
                return Err(RouteTableError::NonCanonicalPath {
                    path: entry.path.to_string(),
                });
            }
            if by_path.insert(entry.path, idx).is_some() {
                return Err(RouteTableError::DuplicatePath {
                    path: entry.path.to_string(),
                });
            }
            if let Some(prev) = entries[..idx]
                .iter()
                .find(|e| e.matches(entry.tab, entry.subtab, entry.subsubtab))
            {
                return Err(RouteTableError::DuplicateTriple {
                    first: prev.path.to_string(),
                    second: entry.path.to_string(),
                });
            }
        }
        Ok(Self {
            entries: entries.to_vec(),
            by_path,
        })
    }

    pub fn standard() -> Result<Self, RouteTableError> {
        Self::new(ROUTES)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.by_path
            .get(normalize(path))
            .and_then(|idx| self.entries.get(*idx))
    }

    /// First entry whose triple matches.
    pub fn reverse(&self, tab: &str, subtab: Option<&str>, subsubtab: Option<&str>) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.matches(tab, subtab, subsubtab))
    }
}
