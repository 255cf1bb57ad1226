use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::logging::{log, log_series_failure, log_series_loaded, obj, v_str, Domain, Level};

pub mod ranges;
pub mod retry;
pub mod source;

use retry::{is_retryable_http_status, retry_async, RetryConfig};
use source::SeriesSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(ts: DateTime<Utc>, value: f64) -> Self {
        Self { ts, value }
    }
}

/// Ascending by timestamp as delivered; nothing downstream re-sorts.
pub type Series = Vec<SeriesPoint>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("retrieval of {id} failed: {reason}")]
    Retrieval {
        id: String,
        status: Option<u16>,
        reason: String,
    },
    #[error("parse of {id} failed at line {line}: {reason}")]
    Parse {
        id: String,
        line: usize,
        reason: String,
    },
}

impl SeriesError {
    pub fn kind(&self) -> &'static str {
        match self {
            SeriesError::Retrieval { .. } => "retrieval",
            SeriesError::Parse { .. } => "parse",
        }
    }

    /// Transport failures and transient HTTP statuses; never parse failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            SeriesError::Retrieval { status: None, .. } => true,
            SeriesError::Retrieval { status: Some(s), .. } => is_retryable_http_status(*s),
            SeriesError::Parse { .. } => false,
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    date: String,
    value: f64,
}

/// Parses a bare `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 instant.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(start_of_day(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parses a newline-delimited JSON payload. Any malformed line fails the
/// whole payload.
pub fn parse_ndjson(id: &str, payload: &str) -> Result<Series, SeriesError> {
    let mut points = Vec::new();
    for (idx, line) in payload.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let fail = |reason: String| SeriesError::Parse {
            id: id.to_string(),
            line: idx + 1,
            reason,
        };
        let raw: RawPoint = serde_json::from_str(trimmed).map_err(|e| fail(e.to_string()))?;
        let ts = parse_instant(&raw.date).ok_or_else(|| fail(format!("bad date: {}", raw.date)))?;
        points.push(SeriesPoint::new(ts, raw.value));
    }
    Ok(points)
}

pub fn payload_sha256(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

// =============================================================================
// Quality report
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesReport {
    pub source: String,
    pub hash_sha256: String,
    pub points: u64,
    pub first: Option<String>,
    pub last: Option<String>,
    pub non_monotonic: u64,
    pub duplicate_timestamps: u64,
    pub warnings: Vec<String>,
}

const MAX_REPORT_WARNINGS: usize = 20;

pub fn analyze_series(source: &str, points: &[SeriesPoint], hash_sha256: &str) -> SeriesReport {
    let mut warnings = Vec::new();
    let mut non_monotonic = 0u64;
    let mut duplicate_timestamps = 0u64;

    for pair in points.windows(2) {
        let (prev, cur) = (pair[0].ts, pair[1].ts);
        if cur == prev {
            duplicate_timestamps += 1;
        } else if cur < prev {
            non_monotonic += 1;
            if warnings.len() < MAX_REPORT_WARNINGS {
                warnings.push(format!(
                    "non_monotonic_ts: prev={} current={}",
                    fmt_ts(prev),
                    fmt_ts(cur)
                ));
            }
        }
    }
    if points.iter().any(|p| !p.value.is_finite()) {
        warnings.push("non_finite_value".to_string());
    }
    if points.is_empty() {
        warnings.push("empty_series".to_string());
    }

    SeriesReport {
        source: source.to_string(),
        hash_sha256: hash_sha256.to_string(),
        points: points.len() as u64,
        first: points.first().map(|p| fmt_ts(p.ts)),
        last: points.last().map(|p| fmt_ts(p.ts)),
        non_monotonic,
        duplicate_timestamps,
        warnings,
    }
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Clone)]
struct CachedSeries {
    points: Arc<Series>,
    hash: String,
}

/// Lazy, write-once cache of parsed series keyed by source path.
pub struct SeriesStore {
    source: Box<dyn SeriesSource>,
    retry: RetryConfig,
    cache: Arc<Mutex<HashMap<String, CachedSeries>>>,
}

impl SeriesStore {
    pub fn new(source: Box<dyn SeriesSource>) -> Self {
        Self::with_retry(source, RetryConfig::default())
    }

    pub fn with_retry(source: Box<dyn SeriesSource>, retry: RetryConfig) -> Self {
        Self {
            source,
            retry,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn cached(&self, id: &str) -> Option<CachedSeries> {
        self.cache.lock().ok().and_then(|c| c.get(id).cloned())
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.cached(id).is_some()
    }

    pub fn cached_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .cache
            .lock()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Returns the cached series, or retrieves and parses it. Failures leave
    /// the cache untouched so the next call retrieves again.
    pub async fn load(&self, id: &str) -> Result<Arc<Series>, SeriesError> {
        if let Some(hit) = self.cached(id) {
            log(
                Level::Trace,
                Domain::Data,
                "cache_hit",
                obj(&[("source", v_str(id))]),
            );
            return Ok(hit.points);
        }

        let fetched = retry_async(&self.retry, id, SeriesError::is_retryable, || {
            self.source.fetch(id)
        })
        .await;
        let payload = match fetched {
            Ok(p) => p,
            Err(err) => {
                log_series_failure(id, err.kind(), &err.to_string());
                return Err(err);
            }
        };

        let points = match parse_ndjson(id, &payload) {
            Ok(p) => p,
            Err(err) => {
                log_series_failure(id, err.kind(), &err.to_string());
                return Err(err);
            }
        };
        let hash = payload_sha256(&payload);
        log_series_loaded(id, points.len(), payload.len(), &hash);

        let entry = CachedSeries {
            points: Arc::new(points),
            hash,
        };
        // A concurrent load may have landed first; the earlier write wins.
        let stored = match self.cache.lock() {
            Ok(mut cache) => cache.entry(id.to_string()).or_insert(entry).clone(),
            Err(_) => entry,
        };
        Ok(stored.points)
    }

    pub fn report(&self, id: &str) -> Option<SeriesReport> {
        self.cached(id)
            .map(|c| analyze_series(id, &c.points, &c.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_dates_and_instants() {
        let payload = "{\"date\":\"2024-01-02\",\"value\":1.5}\n\
                       {\"date\":\"2024-01-03T12:00:00Z\",\"value\":2}\n\n";
        let series = parse_ndjson("x", payload).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].ts, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(series[1].ts, Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap());
        assert_eq!(series[1].value, 2.0);
    }

    #[test]
    fn test_parse_failure_is_whole_payload() {
        let payload = "{\"date\":\"2024-01-02\",\"value\":1.5}\nnot json\n";
        let err = parse_ndjson("x", payload).unwrap_err();
        match err {
            SeriesError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let err = parse_ndjson("x", "{\"date\":\"yesterday\",\"value\":1}").unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retryable_classification() {
        let transport = SeriesError::Retrieval { id: "a".into(), status: None, reason: "reset".into() };
        let missing = SeriesError::Retrieval { id: "a".into(), status: Some(404), reason: "nf".into() };
        let busy = SeriesError::Retrieval { id: "a".into(), status: Some(503), reason: "busy".into() };
        assert!(transport.is_retryable());
        assert!(!missing.is_retryable());
        assert!(busy.is_retryable());
    }

    #[test]
    fn test_report_flags_disorder() {
        let t = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        let points = vec![
            SeriesPoint::new(t(1), 1.0),
            SeriesPoint::new(t(3), 1.0),
            SeriesPoint::new(t(2), 1.0),
            SeriesPoint::new(t(2), 1.0),
        ];
        let report = analyze_series("x", &points, "abc");
        assert_eq!(report.points, 4);
        assert_eq!(report.non_monotonic, 1);
        assert_eq!(report.duplicate_timestamps, 1);
        assert_eq!(report.first.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(payload_sha256("abc"), payload_sha256("abc"));
        assert_ne!(payload_sha256("abc"), payload_sha256("abd"));
    }
}
