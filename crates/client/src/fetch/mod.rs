//! HTTP fetch with a hard timeout.
//!
//! Every outbound request carries a marker header identifying it as
//! worker-issued, is scoped to same-origin credentials (no cookie jar),
//! and is cancelled by a single timeout signal. Timeouts and transport
//! errors surface as recoverable [`Error`] values; non-success statuses
//! do not — the strategies decide what a non-200 means.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use url::Url;

use cachework_core::{Error, StoredResponse, WorkerConfig};

/// Marker header attached to every worker-issued request.
pub const MARKER_HEADER: (&str, &str) = ("x-requested-with", "cachework");

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cachework/0.1")
    pub user_agent: String,

    /// Hard request timeout (default: 5s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "cachework/0.1".to_string(), timeout: Duration::from_millis(5_000), max_redirects: 5 }
    }
}

impl FetchConfig {
    /// Derive fetch settings from the worker configuration.
    pub fn from_worker(config: &WorkerConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response headers, lowercase names
    pub headers: BTreeMap<String, String>,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Convert into the form the cache stores and the worker serves.
    pub fn into_stored(self) -> StoredResponse {
        StoredResponse::new(self.status, self.headers, self.body)
    }
}

/// Seam between the retrieval strategies and the network.
///
/// The worker's strategy tests substitute a counting mock here to assert
/// that cache hits make no network calls.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client with a hard timeout.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    ///
    /// No cookie store is configured, so requests carry no ambient
    /// credentials beyond the same connection.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let mut marker = header::HeaderMap::new();
        marker.insert(MARKER_HEADER.0, header::HeaderValue::from_static(MARKER_HEADER.1));

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .default_headers(marker)
            .build()
            .map_err(|e| Error::FetchFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    /// Issue a GET, returning body and metadata whatever the status.
    ///
    /// Fails only on timeout or transport error; the caller proceeds to
    /// its fallback path in that case.
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self.http.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url} after {:?}", self.config.timeout))
            } else {
                Error::FetchFailed(format!("network error: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_ascii_lowercase(), v.to_string())))
            .collect();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url} reading body"))
            } else {
                Error::FetchFailed(format!("failed to read response: {e}"))
            }
        })?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} status {} in {}ms ({} bytes)", url, final_url, status, fetch_ms, body.len());

        Ok(FetchResponse { final_url, status, headers, body, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "cachework/0.1");
        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_worker() {
        let worker = WorkerConfig { timeout_ms: 1_234, user_agent: "site/2.0".into(), ..Default::default() };
        let config = FetchConfig::from_worker(&worker);
        assert_eq!(config.timeout, Duration::from_millis(1_234));
        assert_eq!(config.user_agent, "site/2.0");
    }

    #[test]
    fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_into_stored_preserves_body_and_status() {
        let response = FetchResponse {
            final_url: Url::parse("https://example.com/a").unwrap(),
            status: 200,
            headers: BTreeMap::from([("content-type".to_string(), "text/css".to_string())]),
            body: Bytes::from_static(b"body { }"),
            fetch_ms: 7,
        };

        let stored = response.into_stored();
        assert_eq!(stored.status, 200);
        assert_eq!(stored.header("content-type"), Some("text/css"));
        assert_eq!(stored.body, Bytes::from_static(b"body { }"));
    }
}
