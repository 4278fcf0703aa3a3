//! Configuration validation rules.
//!
//! This module provides validation logic for `WorkerConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::WorkerConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl WorkerConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_entries` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 1 minute
    /// - `max_age_secs` is 0
    /// - `cache_version` is empty or escapes the namespace prefix
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid { field: "max_entries".into(), reason: "must be greater than 0".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.max_age_secs == 0 {
            return Err(ConfigError::Invalid { field: "max_age_secs".into(), reason: "must be greater than 0".into() });
        }

        if self.cache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "cache_version".into(), reason: "must not be empty".into() });
        }
        if !self.cache_version.starts_with(&self.cache_prefix) {
            // Cleanup only considers prefix-matching names, so a version
            // outside the namespace would never be purged.
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: format!("must start with cache_prefix {:?}", self.cache_prefix),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.core_files.is_empty() {
            tracing::warn!("core_files manifest is empty; install will pre-warm nothing");
        }

        Ok(())
    }
}
