//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CACHEWORK_*)
//! 2. TOML config file (if CACHEWORK_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::Generation;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CACHEWORK_*)
/// 2. TOML config file (if CACHEWORK_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Cache version epoch. Changing it invalidates every store created
    /// under the previous version.
    ///
    /// Set via CACHEWORK_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Namespace prefix shared by all cache versions of this site.
    /// Stores carrying the prefix but not the current version are stale.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// The site's own origin; requests to it are always handled.
    ///
    /// Set via CACHEWORK_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// External origins allowed through the interception boundary.
    /// Exact membership only, no wildcard or suffix matching.
    #[serde(default = "default_trusted_origins")]
    pub trusted_origins: Vec<String>,

    /// Root-relative paths (plus external font stylesheet) pre-fetched
    /// into the static store at install.
    #[serde(default = "default_core_files")]
    pub core_files: Vec<String>,

    /// Maximum entries kept in the dynamic and images stores.
    ///
    /// Set via CACHEWORK_MAX_ENTRIES environment variable.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum age of a cached entry before it is treated as a miss.
    ///
    /// Set via CACHEWORK_MAX_AGE_SECS environment variable.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Hard network timeout in milliseconds.
    ///
    /// Set via CACHEWORK_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent string for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_cache_version() -> String {
    "cachework-site-v1".into()
}

fn default_cache_prefix() -> String {
    "cachework-".into()
}

fn default_origin() -> String {
    "https://example.com".into()
}

fn default_trusted_origins() -> Vec<String> {
    vec![
        "https://fonts.googleapis.com".into(),
        "https://fonts.gstatic.com".into(),
        "https://cdn.jsdelivr.net".into(),
    ]
}

fn default_core_files() -> Vec<String> {
    vec![
        "/".into(),
        "/index.html".into(),
        "/css/style.css".into(),
        "/js/script.js".into(),
        "/manifest.json".into(),
        "/images/logo.svg".into(),
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600&display=swap".into(),
    ]
}

fn default_max_entries() -> usize {
    50
}

fn default_max_age_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "cachework/0.1".into()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            trusted_origins: default_trusted_origins(),
            core_files: default_core_files(),
            max_entries: default_max_entries(),
            max_age_secs: default_max_age_secs(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl WorkerConfig {
    /// Network timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Maximum entry age as a Duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Store name for a generation under the current version,
    /// e.g. `cachework-site-v1-static`.
    pub fn store_name(&self, generation: Generation) -> String {
        format!("{}-{}", self.cache_version, generation.name())
    }

    /// The three store names of the current version.
    pub fn current_store_names(&self) -> [String; 3] {
        [
            self.store_name(Generation::Static),
            self.store_name(Generation::Dynamic),
            self.store_name(Generation::Images),
        ]
    }

    /// Whether a store name belongs to this site's namespace but not to
    /// the current version, making it eligible for deletion.
    pub fn is_stale_store(&self, name: &str) -> bool {
        name.starts_with(&self.cache_prefix) && !self.current_store_names().iter().any(|n| n == name)
    }

    /// Exact membership test against the trusted-origin allow-list.
    pub fn is_trusted_origin(&self, origin: &str) -> bool {
        self.trusted_origins.iter().any(|o| o == origin)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CACHEWORK_`
    /// 2. TOML file from `CACHEWORK_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or validation
    /// fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CACHEWORK_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CACHEWORK_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
