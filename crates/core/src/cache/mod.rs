//! Versioned in-memory cache storage.
//!
//! Named stores keyed by full request identity, scoped to a cache-version
//! epoch. Whole-store deletion of stale version names is the sole
//! migration mechanism between epochs; there is no field-level upgrade.

pub mod hash;
pub mod store;

pub use crate::Error;

pub use store::{CacheStorage, CachedEntry, Generation};
