//! Install/activate lifecycle and cache housekeeping.
//!
//! Both transitions are awaited to completion by the caller; nothing
//! here runs detached. Failures are logged and never block the worker
//! from reaching the active state: the only fallible step, manifest
//! pre-warming, is isolated per file.

use futures::future;
use url::Url;

use cachework_core::{Error, Generation};

use crate::worker::{FetchRequest, Worker, WorkerEvent, WorkerState};

/// Sync registration tag recognized by the background-sync hook.
const BACKGROUND_SYNC_TAG: &str = "background-sync";

impl Worker {
    /// Install transition: purge stale generations, pre-warm the static
    /// store from the core-file manifest, and make this version eligible
    /// for immediate activation.
    ///
    /// Pre-warming is best-effort: each manifest file succeeds or fails
    /// independently and a partial static store is acceptable.
    pub async fn install(&self) {
        tracing::info!(version = %self.config().cache_version, "worker installing");

        self.cleanup().await;

        let store = self.config().store_name(Generation::Static);
        self.storage().open(&store).await;

        let files = &self.config().core_files;
        let results = future::join_all(files.iter().map(|path| self.prewarm(&store, path))).await;
        let cached = results.iter().filter(|r| r.is_ok()).count();
        tracing::info!(cached, total = results.len(), "core files pre-warmed");

        self.set_state(WorkerState::Installed).await;
        // Skip waiting: do not hold the new version back for old clients.
        tracing::info!("new version eligible for immediate activation");
    }

    /// Activate transition: purge stale generations, take control of all
    /// open clients, and broadcast the new version to them.
    pub async fn activate(&self) {
        tracing::info!(version = %self.config().cache_version, "worker activating");

        self.cleanup().await;

        // Claiming clients means existing pages are controlled now, not
        // only after their next navigation.
        self.set_state(WorkerState::Active).await;
        self.notify_clients(WorkerEvent::Activated { version: self.config().cache_version.clone() });

        tracing::info!("worker activated");
    }

    /// Force immediate activation instead of waiting for old clients to
    /// close. No-op when already active.
    pub async fn skip_waiting(&self) {
        if self.state().await != WorkerState::Active {
            tracing::info!("skip-waiting requested, activating immediately");
            self.activate().await;
        }
    }

    /// Delete stale-version stores and enforce the max-entries cap on the
    /// bounded generations. Invoked by both lifecycle transitions and by
    /// the force-update command.
    pub async fn cleanup(&self) {
        for name in self.storage().store_names().await {
            if self.config().is_stale_store(&name) {
                tracing::info!(store = %name, "deleting stale cache generation");
                self.storage().delete_store(&name).await;
            }
        }

        for generation in Generation::bounded() {
            let store = self.config().store_name(generation);
            let deleted = self.storage().trim_to(&store, self.config().max_entries).await;
            if deleted > 0 {
                tracing::info!(store = %store, deleted, "trimmed store to max entries");
            }
        }
    }

    /// Background-sync hook: drain queued offline actions for the
    /// recognized tag and tell clients the sync finished. Unknown tags
    /// are ignored.
    pub async fn background_sync(&self, tag: &str) {
        if tag != BACKGROUND_SYNC_TAG {
            tracing::debug!(tag, "ignoring unknown sync tag");
            return;
        }

        tracing::info!("background sync triggered");
        self.notify_clients(WorkerEvent::SyncComplete);
    }

    /// Fetch one manifest file into the static store.
    async fn prewarm(&self, store: &str, path: &str) -> Result<(), Error> {
        let url = self.resolve_manifest_url(path)?;

        let fetched = match self.fetcher().fetch(&url).await {
            Ok(fetched) if fetched.status == 200 => fetched,
            Ok(fetched) => {
                tracing::warn!(path, status = fetched.status, "failed to cache core file");
                return Err(Error::HttpStatus(fetched.status));
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "error caching core file");
                return Err(e);
            }
        };

        let key = FetchRequest::get(url).key();
        self.storage().put(store, &key, fetched.into_stored()).await;
        tracing::debug!(path, "cached core file");
        Ok(())
    }

    /// Root-relative manifest paths resolve against the site origin;
    /// anything else (the external font stylesheet) must be absolute.
    fn resolve_manifest_url(&self, path: &str) -> Result<Url, Error> {
        let url = if path.starts_with('/') {
            Url::parse(&self.config().origin)
                .and_then(|origin| origin.join(path))
                .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?
        } else {
            Url::parse(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?
        };
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockFetcher, fresh_response};
    use cachework_core::WorkerConfig;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn worker_with(fetcher: MockFetcher) -> Worker {
        Worker::new(WorkerConfig::default(), Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_install_prewarms_static_store() {
        let fetcher = MockFetcher::ok(200);
        let calls = fetcher.counter();
        let worker = worker_with(fetcher);

        worker.install().await;

        let store = worker.config().store_name(Generation::Static);
        let manifest_len = worker.config().core_files.len();
        assert_eq!(worker.storage().len(&store).await, manifest_len);
        assert_eq!(calls.load(Ordering::SeqCst), manifest_len);
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_tolerates_total_prefetch_failure() {
        let worker = worker_with(MockFetcher::failing());

        worker.install().await;

        let store = worker.config().store_name(Generation::Static);
        assert_eq!(worker.storage().len(&store).await, 0);
        // Install still completes; failures are per-file and non-fatal.
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_activate_purges_stale_versions() {
        let worker = worker_with(MockFetcher::ok(200));
        worker
            .storage()
            .put("cachework-site-v0-static", "old-key", fresh_response("old"))
            .await;

        worker.activate().await;

        assert!(!worker.storage().store_names().await.iter().any(|n| n == "cachework-site-v0-static"));
        assert_eq!(worker.state().await, WorkerState::Active);
    }

    #[tokio::test]
    async fn test_activate_broadcasts_version() {
        let worker = worker_with(MockFetcher::ok(200));
        let mut events = worker.subscribe();

        worker.activate().await;

        let event = events.recv().await.unwrap();
        assert_eq!(event, WorkerEvent::Activated { version: "cachework-site-v1".to_string() });
    }

    #[tokio::test]
    async fn test_cleanup_enforces_image_store_cap() {
        let worker = worker_with(MockFetcher::ok(200));
        let store = worker.config().store_name(Generation::Images);
        for i in 0..60 {
            worker.storage().put(&store, &format!("key-{i}"), fresh_response("img")).await;
        }

        worker.cleanup().await;

        assert_eq!(worker.storage().len(&store).await, 50);
        let keys = worker.storage().keys(&store).await;
        for i in 0..10 {
            assert!(!keys.contains(&format!("key-{i}")), "key-{i} should be evicted");
        }
        for i in 10..60 {
            assert!(keys.contains(&format!("key-{i}")), "key-{i} should survive");
        }
    }

    #[tokio::test]
    async fn test_cleanup_leaves_static_store_unbounded() {
        let worker = worker_with(MockFetcher::ok(200));
        let store = worker.config().store_name(Generation::Static);
        for i in 0..60 {
            worker.storage().put(&store, &format!("key-{i}"), fresh_response("css")).await;
        }

        worker.cleanup().await;
        assert_eq!(worker.storage().len(&store).await, 60);
    }

    #[tokio::test]
    async fn test_cleanup_spares_foreign_namespaces() {
        let worker = worker_with(MockFetcher::ok(200));
        worker.storage().put("other-app-cache", "k", fresh_response("x")).await;

        worker.cleanup().await;
        assert_eq!(worker.storage().len("other-app-cache").await, 1);
    }

    #[tokio::test]
    async fn test_skip_waiting_activates_once() {
        let worker = worker_with(MockFetcher::ok(200));
        assert_eq!(worker.state().await, WorkerState::Idle);

        worker.skip_waiting().await;
        assert_eq!(worker.state().await, WorkerState::Active);

        // Already active: second call is a no-op, no second broadcast.
        let mut events = worker.subscribe();
        worker.skip_waiting().await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_background_sync_broadcasts_completion() {
        let worker = worker_with(MockFetcher::ok(200));
        let mut events = worker.subscribe();

        worker.background_sync("background-sync").await;
        assert_eq!(events.recv().await.unwrap(), WorkerEvent::SyncComplete);

        worker.background_sync("unknown-tag").await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_version_migration_resolves_against_new_stores_only() {
        // Entries cached under the old epoch are unreachable after
        // activation of the new one.
        let worker = worker_with(MockFetcher::ok(200));
        worker
            .storage()
            .put("cachework-site-v0-dynamic", "shared-key", fresh_response("v0"))
            .await;

        worker.activate().await;

        assert!(worker.storage().match_key("cachework-site-v0-dynamic", "shared-key").await.is_none());
        let names = worker.storage().store_names().await;
        assert!(names.iter().all(|n| !worker.config().is_stale_store(n)));
    }
}
