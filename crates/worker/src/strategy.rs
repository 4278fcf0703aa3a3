//! Retrieval strategies: cache-first and network-first.
//!
//! Both strategies always produce a response; a fetch failure never
//! escapes to the caller. The terminal fallback is the offline document.
//! Network and cache are consulted strictly sequentially, never raced.

use cachework_core::response::offline_response;
use cachework_core::{CachedEntry, Generation, StoredResponse};

use crate::worker::{FetchRequest, Worker};

impl Worker {
    /// Serve from cache when fresh; otherwise fetch, write back on a 200,
    /// and fall back to the offline document on any failure.
    pub(crate) async fn cache_first(&self, request: &FetchRequest, generation: Generation) -> StoredResponse {
        let store = self.config().store_name(generation);
        let key = request.key();

        if let Some(entry) = self.storage().match_key(&store, &key).await {
            if self.validate_entry(&entry) {
                tracing::debug!(%store, url = %request.url, "cache-first hit");
                return entry.response.with_security_headers();
            }
            tracing::debug!(%store, url = %request.url, "cached entry expired");
        }

        match self.fetcher().fetch(&request.url).await {
            Ok(fetched) if fetched.status == 200 => {
                let response = fetched.into_stored();
                self.storage().put(&store, &key, response.clone()).await;
                response.with_security_headers()
            }
            Ok(fetched) => {
                tracing::warn!(url = %request.url, status = fetched.status, "cache-first fetch returned non-200");
                offline_response()
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache-first strategy failed");
                offline_response()
            }
        }
    }

    /// Try the network first regardless of cache freshness; on a 200,
    /// write back and serve. Otherwise fall back to a fresh cached entry,
    /// then to the offline document.
    pub(crate) async fn network_first(&self, request: &FetchRequest, generation: Generation) -> StoredResponse {
        let store = self.config().store_name(generation);
        let key = request.key();

        match self.fetcher().fetch(&request.url).await {
            Ok(fetched) if fetched.status == 200 => {
                let response = fetched.into_stored();
                self.storage().put(&store, &key, response.clone()).await;
                return response.with_security_headers();
            }
            Ok(fetched) => {
                tracing::debug!(url = %request.url, status = fetched.status, "network-first falling back to cache");
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "network-first fetch failed, falling back to cache");
            }
        }

        if let Some(entry) = self.storage().match_key(&store, &key).await {
            if self.validate_entry(&entry) {
                return entry.response.with_security_headers();
            }
        }

        offline_response()
    }

    /// An entry is usable only while its age stays within max-age.
    ///
    /// The html branch is a pass-through: stricter content validation for
    /// text/html was never implemented upstream and is preserved as-is.
    fn validate_entry(&self, entry: &CachedEntry) -> bool {
        if !entry.is_fresh(self.config().max_age()) {
            return false;
        }

        if let Some(content_type) = entry.response.header("content-type") {
            if content_type.contains("text/html") {
                return true;
            }
        }

        true
    }
}
