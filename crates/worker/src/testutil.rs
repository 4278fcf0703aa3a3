//! Shared test helpers: a counting mock fetcher and canned responses.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use cachework_client::{FetchResponse, Fetcher};
use cachework_core::{Error, StoredResponse};

enum Mode {
    Status(u16),
    Fail,
}

/// A fetcher that counts calls and answers every URL the same way.
pub struct MockFetcher {
    calls: Arc<AtomicUsize>,
    mode: Mode,
}

impl MockFetcher {
    /// Answer every fetch with the given status and a body naming the path.
    pub fn ok(status: u16) -> Self {
        Self { calls: Arc::new(AtomicUsize::new(0)), mode: Mode::Status(status) }
    }

    /// Fail every fetch with a network error.
    pub fn failing() -> Self {
        Self { calls: Arc::new(AtomicUsize::new(0)), mode: Mode::Fail }
    }

    /// Handle to the call counter, kept by tests before the fetcher is
    /// moved into a worker.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Mode::Fail => Err(Error::FetchFailed("mock network down".to_string())),
            Mode::Status(status) => Ok(FetchResponse {
                final_url: url.clone(),
                status,
                headers: BTreeMap::new(),
                body: Bytes::from(format!("fetched {}", url.path())),
                fetch_ms: 1,
            }),
        }
    }
}

/// A 200 response that counts as freshly stored.
pub fn fresh_response(body: &str) -> StoredResponse {
    StoredResponse::new(200, BTreeMap::new(), Bytes::from(body.to_string()))
}

/// A 200 response whose `date` header puts it `age` in the past.
pub fn aged_response(body: &str, age: chrono::Duration) -> StoredResponse {
    let date = (chrono::Utc::now() - age).to_rfc2822();
    let headers = BTreeMap::from([("date".to_string(), date)]);
    StoredResponse::new(200, headers, Bytes::from(body.to_string()))
}
