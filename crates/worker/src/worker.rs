//! The worker: interception boundary, strategy routing, and state.
//!
//! A [`Worker`] owns the configuration, the cache storage, the fetcher,
//! and a broadcast channel to controlled clients. Request handling is
//! strictly sequential within one request; across requests, concurrent
//! handlers interleave freely and same-key writes are last-write-wins.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use url::Url;

use cachework_client::Fetcher;
use cachework_core::cache::hash::request_key;
use cachework_core::{CacheStorage, Generation, ResourceClass, StoredResponse, WorkerConfig};

/// Lifecycle state, driven by install/activate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No install has run yet.
    Idle,
    /// Installed and eligible for activation.
    Installed,
    /// Controlling clients.
    Active,
}

/// Outbound lifecycle notifications delivered to every controlled client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Activated { version: String },
    SyncComplete,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
}

impl FetchRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_ascii_uppercase(), url }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Cache key over the full request identity.
    pub fn key(&self) -> String {
        request_key(&self.method, self.url.as_str(), "")
    }
}

/// Outcome of the interception boundary.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The worker produced a response.
    Handled(StoredResponse),
    /// Default platform handling; the worker stays out of the way.
    Passthrough,
}

/// The caching worker.
pub struct Worker {
    config: Arc<WorkerConfig>,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    state: RwLock<WorkerState>,
    events: broadcast::Sender<WorkerEvent>,
}

impl Worker {
    pub fn new(config: WorkerConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { config: Arc::new(config), storage: CacheStorage::new(), fetcher, state: RwLock::new(WorkerState::Idle), events }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub(crate) fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Register a client for lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    /// Broadcast to all controlled clients. A zero-receiver send is not
    /// an error; there may simply be no open pages.
    pub(crate) fn notify_clients(&self, event: WorkerEvent) {
        let delivered = self.events.send(event).unwrap_or(0);
        tracing::debug!(clients = delivered, "lifecycle notification sent");
    }

    /// The interception boundary.
    ///
    /// Non-GET and non-http(s) requests pass through untouched, as do
    /// requests to origins that are neither our own nor on the trusted
    /// allow-list. Everything else is routed by resource class and is
    /// guaranteed a response.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        if !request.is_get() {
            return FetchOutcome::Passthrough;
        }

        match request.url.scheme() {
            "http" | "https" => {}
            _ => return FetchOutcome::Passthrough,
        }

        let origin = request.url.origin().ascii_serialization();
        if origin != self.config.origin && !self.config.is_trusted_origin(&origin) {
            tracing::warn!(%origin, "blocked request to untrusted origin");
            return FetchOutcome::Passthrough;
        }

        let class = ResourceClass::classify(request.url.path());
        let response = match class {
            ResourceClass::CoreAsset => self.cache_first(request, Generation::Static).await,
            ResourceClass::Image => self.cache_first(request, Generation::Images).await,
            ResourceClass::Html | ResourceClass::Api | ResourceClass::Other => {
                self.network_first(request, Generation::Dynamic).await
            }
        };

        FetchOutcome::Handled(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockFetcher;
    use cachework_core::response::offline_response;

    fn worker_with(fetcher: MockFetcher) -> Worker {
        Worker::new(WorkerConfig::default(), Arc::new(fetcher))
    }

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://example.com{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let fetcher = MockFetcher::ok(200);
        let calls = fetcher.counter();
        let worker = worker_with(fetcher);
        let request = FetchRequest::new("POST", url("/api/data.json"));
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_untrusted_origin_passes_through() {
        let worker = worker_with(MockFetcher::ok(200));
        let request = FetchRequest::get(Url::parse("https://evil.example/x.css").unwrap());
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Passthrough));
    }

    #[tokio::test]
    async fn test_trusted_origin_is_handled() {
        let worker = worker_with(MockFetcher::ok(200));
        let request = FetchRequest::get(Url::parse("https://fonts.googleapis.com/css2?family=Inter").unwrap());
        assert!(matches!(worker.handle_fetch(&request).await, FetchOutcome::Handled(_)));
    }

    #[tokio::test]
    async fn test_routing_core_asset_fills_static_store() {
        let worker = worker_with(MockFetcher::ok(200));
        worker.handle_fetch(&FetchRequest::get(url("/css/style.css"))).await;

        let static_store = worker.config().store_name(Generation::Static);
        assert_eq!(worker.storage().len(&static_store).await, 1);
    }

    #[tokio::test]
    async fn test_routing_image_fills_images_store() {
        let worker = worker_with(MockFetcher::ok(200));
        worker.handle_fetch(&FetchRequest::get(url("/images/logo.svg"))).await;

        let images_store = worker.config().store_name(Generation::Images);
        assert_eq!(worker.storage().len(&images_store).await, 1);
    }

    #[tokio::test]
    async fn test_routing_html_api_other_fill_dynamic_store() {
        let worker = worker_with(MockFetcher::ok(200));
        for path in ["/", "/api/data.json", "/video/clip.mp4"] {
            worker.handle_fetch(&FetchRequest::get(url(path))).await;
        }

        let dynamic_store = worker.config().store_name(Generation::Dynamic);
        assert_eq!(worker.storage().len(&dynamic_store).await, 3);
    }

    #[tokio::test]
    async fn test_handled_never_propagates_failure() {
        let worker = worker_with(MockFetcher::failing());
        let outcome = worker.handle_fetch(&FetchRequest::get(url("/api/data.json"))).await;
        let FetchOutcome::Handled(response) = outcome else {
            panic!("expected a handled response");
        };
        assert_eq!(response.status, 200);
        assert_eq!(response.body, offline_response().body);
    }

    #[test]
    fn test_request_key_includes_method() {
        let get = FetchRequest::get(url("/a"));
        let head = FetchRequest::new("HEAD", url("/a"));
        assert_ne!(get.key(), head.key());
    }
}
