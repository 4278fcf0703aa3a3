//! Named, versioned key-value stores over request identity.
//!
//! Uses a HashMap of insertion-ordered stores behind a tokio RwLock for
//! concurrent access. Writes replace whole entries; nothing is mutated
//! in place. Concurrent writers to the same key are last-write-wins,
//! which is the platform contract this layer assumes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::response::StoredResponse;

/// The three cache generations of one version epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// Pre-warmed core assets, cache-first.
    Static,
    /// HTML, API and everything else, network-first, size-bounded.
    Dynamic,
    /// Images, cache-first, size-bounded.
    Images,
}

impl Generation {
    pub fn name(&self) -> &'static str {
        match self {
            Generation::Static => "static",
            Generation::Dynamic => "dynamic",
            Generation::Images => "images",
        }
    }

    /// Generations with a max-entries cap enforced during cleanup.
    pub fn bounded() -> [Generation; 2] {
        [Generation::Dynamic, Generation::Images]
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored response plus the metadata needed for age checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub response: StoredResponse,
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn new(response: StoredResponse) -> Self {
        Self { response, stored_at: Utc::now() }
    }

    /// Age of the entry, preferring the response's own `date` header
    /// over the local insertion timestamp when it parses.
    pub fn age(&self) -> Duration {
        let reference = self
            .response
            .header("date")
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(self.stored_at);

        (Utc::now() - reference).to_std().unwrap_or(Duration::ZERO)
    }

    /// An entry older than `max_age` is treated as a cache miss.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() <= max_age
    }
}

/// One named store: key → entry, insertion-ordered for eviction.
#[derive(Debug, Default)]
struct NamedStore {
    entries: Vec<(String, CachedEntry)>,
}

impl NamedStore {
    fn put(&mut self, key: String, entry: CachedEntry) {
        // A rewrite counts as newest for eviction purposes.
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, entry));
    }

    fn get(&self, key: &str) -> Option<&CachedEntry> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    fn delete(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() < before
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

/// All named stores of the worker, shared across tasks.
///
/// Cloning is cheap and shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    stores: Arc<RwLock<HashMap<String, NamedStore>>>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently create the named store.
    ///
    /// Stores are also created lazily by `put`, so callers only need
    /// this when pre-warming.
    pub async fn open(&self, name: &str) {
        let mut stores = self.stores.write().await;
        stores.entry(name.to_string()).or_default();
    }

    /// Insert or replace the entry for `key`, creating the store if
    /// absent. The entry moves to the tail of the eviction order.
    pub async fn put(&self, name: &str, key: &str, response: StoredResponse) {
        let mut stores = self.stores.write().await;
        stores
            .entry(name.to_string())
            .or_default()
            .put(key.to_string(), CachedEntry::new(response));
    }

    /// Look up the entry for `key`, or `None` on miss (including a
    /// missing store).
    pub async fn match_key(&self, name: &str, key: &str) -> Option<CachedEntry> {
        let stores = self.stores.read().await;
        stores.get(name).and_then(|s| s.get(key)).cloned()
    }

    /// Keys of the named store in insertion order, oldest first.
    pub async fn keys(&self, name: &str) -> Vec<String> {
        let stores = self.stores.read().await;
        stores.get(name).map(NamedStore::keys).unwrap_or_default()
    }

    /// Number of entries in the named store (0 if it does not exist).
    pub async fn len(&self, name: &str) -> usize {
        let stores = self.stores.read().await;
        stores.get(name).map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Delete one entry. Returns whether it existed.
    pub async fn delete(&self, name: &str, key: &str) -> bool {
        let mut stores = self.stores.write().await;
        stores.get_mut(name).is_some_and(|s| s.delete(key))
    }

    /// Delete a whole store. Returns whether it existed.
    pub async fn delete_store(&self, name: &str) -> bool {
        let mut stores = self.stores.write().await;
        stores.remove(name).is_some()
    }

    /// Names of all existing stores, sorted for deterministic replies.
    pub async fn store_names(&self) -> Vec<String> {
        let stores = self.stores.read().await;
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Delete oldest entries until the store holds at most `max_entries`.
    /// Returns the number of deleted entries.
    pub async fn trim_to(&self, name: &str, max_entries: usize) -> usize {
        let mut stores = self.stores.write().await;
        let Some(store) = stores.get_mut(name) else {
            return 0;
        };
        if store.entries.len() <= max_entries {
            return 0;
        }
        let excess = store.entries.len() - max_entries;
        store.entries.drain(..excess);
        excess
    }
}
