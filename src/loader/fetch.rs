//! Byte fetchers: where table payloads come from.

use crate::error::{Result, ResultExt as _, SimError};
use std::sync::OnceLock;
use std::time::Duration;

/// Produces the raw bytes behind a source identifier.
///
/// Any `Fn(&str) -> Result<Vec<u8>>` is a fetcher, which is how tests
/// simulate remote sources offline.
pub trait ByteFetcher: Send + Sync {
    fn fetch(&self, source: &str) -> Result<Vec<u8>>;
}

impl<F> ByteFetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        self(source)
    }
}

/// Blocking HTTP(S) downloads.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tabsim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ByteFetcher for HttpFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        tracing::debug!(url = source, "Downloading");
        let response = self.client.get(source).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Local files, given as plain paths or `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ByteFetcher for FileFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        let path = source.strip_prefix("file://").unwrap_or(source);
        tracing::debug!(path, "Reading local source");
        std::fs::read(path).with_context(|| format!("Failed to read {path}"))
    }
}

/// HTTP for `http(s)://` sources, the filesystem for everything else.
///
/// The HTTP client is built on first use.
#[derive(Debug)]
pub struct DefaultFetcher {
    timeout: Duration,
    http: OnceLock<HttpFetcher>,
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(crate::config::DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

impl DefaultFetcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            http: OnceLock::new(),
        }
    }

    fn http(&self) -> Result<&HttpFetcher> {
        if let Some(http) = self.http.get() {
            return Ok(http);
        }
        let built = HttpFetcher::new(self.timeout)?;
        Ok(self.http.get_or_init(|| built))
    }
}

impl ByteFetcher for DefaultFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        if is_remote(source) {
            self.http()?.fetch(source)
        } else if source.contains("://") && !source.starts_with("file://") {
            Err(SimError::config(format!("Unsupported source scheme: {source}")))
        } else {
            FileFetcher.fetch(source)
        }
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.get(..8).unwrap_or(source).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
