use crate::data::retry::RetryConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub series_base_url: String,
    /// Read series files from this directory instead of over HTTP.
    pub series_dir: Option<String>,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub initial_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            series_base_url: "http://localhost:8080/".to_string(),
            series_dir: None,
            http_timeout_secs: 10,
            max_retries: 0,
            retry_base_ms: 100,
            retry_max_ms: 5000,
            initial_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            series_base_url: std::env::var("SERIES_BASE_URL").unwrap_or(d.series_base_url),
            series_dir: std::env::var("SERIES_DIR").ok().filter(|v| !v.is_empty()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.http_timeout_secs),
            max_retries: std::env::var("SERIES_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(d.max_retries),
            retry_base_ms: std::env::var("SERIES_RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.retry_base_ms),
            retry_max_ms: std::env::var("SERIES_RETRY_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.retry_max_ms),
            initial_path: std::env::var("INITIAL_PATH").ok().filter(|v| !v.is_empty()),
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_ms,
            max_delay_ms: self.retry_max_ms,
            ..RetryConfig::default()
        }
    }
}
