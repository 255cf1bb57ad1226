use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use super::SeriesError;

/// Static file retrieval for series payloads, keyed by relative path.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, SeriesError>;
}

/// Fetches `<base>/<path>` over HTTP.
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base: Url::parse(&normalized)?,
        })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SeriesSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<String, SeriesError> {
        let fail = |status: Option<u16>, reason: String| SeriesError::Retrieval {
            id: path.to_string(),
            status,
            reason,
        };
        let url = self.url_for(path).map_err(|e| fail(None, e.to_string()))?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fail(Some(status.as_u16()), format!("status {}", status)));
        }
        resp.text()
            .await
            .map_err(|e| fail(None, e.to_string()))
    }
}

/// Reads `<root>/<path>` from local disk.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SeriesSource for DirSource {
    async fn fetch(&self, path: &str) -> Result<String, SeriesError> {
        let full = self.root.join(path.trim_start_matches('/'));
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| SeriesError::Retrieval {
                id: path.to_string(),
                status: (e.kind() == std::io::ErrorKind::NotFound).then_some(404),
                reason: format!("{}: {}", full.display(), e),
            })
    }
}
