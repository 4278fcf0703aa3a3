//! Core types and shared functionality for cachework.
//!
//! This crate provides:
//! - Versioned in-memory cache storage with insertion-order eviction
//! - Resource classification for strategy routing
//! - Stored response model with security-header stamping
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod response;

pub use cache::{CacheStorage, CachedEntry, Generation};
pub use classify::ResourceClass;
pub use config::WorkerConfig;
pub use error::Error;
pub use response::StoredResponse;
