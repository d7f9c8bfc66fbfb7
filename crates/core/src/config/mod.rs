//! Proxy configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CACHEFRONT_*)
//! 2. TOML config file (if CACHEFRONT_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Push notification presentation settings.
///
/// A push payload carries only a text body; everything else shown to
/// the user comes from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Notification body used when a push payload is absent or unreadable.
    #[serde(default = "default_push_body")]
    pub default_body: String,

    /// Notification title.
    #[serde(default = "default_push_title")]
    pub title: String,

    /// Icon path, resolved against the origin.
    #[serde(default = "default_push_icon")]
    pub icon: String,

    /// Badge path, resolved against the origin.
    #[serde(default = "default_push_badge")]
    pub badge: String,

    /// Vibration pattern in milliseconds.
    #[serde(default = "default_vibration")]
    pub vibration: Vec<u32>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            default_body: default_push_body(),
            title: default_push_title(),
            icon: default_push_icon(),
            badge: default_push_badge(),
            vibration: default_vibration(),
        }
    }
}

/// Proxy configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CACHEFRONT_*)
/// 2. TOML config file (if CACHEFRONT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// The proxy's own origin. Requests to any other origin are never
    /// intercepted.
    ///
    /// Set via CACHEFRONT_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Precache partition name. Bump on deployment to invalidate the
    /// precached asset set wholesale.
    ///
    /// Set via CACHEFRONT_PRECACHE_VERSION environment variable.
    #[serde(default = "default_precache_version")]
    pub precache_version: String,

    /// Runtime partition name. Bump to rebuild the opportunistic cache
    /// from scratch at the next activation.
    ///
    /// Set via CACHEFRONT_RUNTIME_VERSION environment variable.
    #[serde(default = "default_runtime_version")]
    pub runtime_version: String,

    /// Same-origin paths fetched into the precache at install time.
    /// All of them must be fetchable or the install aborts.
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// URL substrings marking dynamic backend endpoints that are never
    /// read from or written to cache.
    #[serde(default = "default_excluded_patterns")]
    pub excluded_patterns: Vec<String>,

    /// Path to the SQLite store.
    ///
    /// Set via CACHEFRONT_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for upstream fetches.
    ///
    /// Set via CACHEFRONT_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream fetch timeout in milliseconds.
    ///
    /// Set via CACHEFRONT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch (and store) per response.
    ///
    /// Set via CACHEFRONT_MAX_BODY_BYTES environment variable.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// The single recognized background-sync tag. Sync triggers with
    /// any other tag are ignored.
    ///
    /// Set via CACHEFRONT_SYNC_TAG environment variable.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Push notification presentation.
    #[serde(default)]
    pub push: PushConfig,
}

fn default_origin() -> String {
    "https://localhost:8080".into()
}

fn default_precache_version() -> String {
    "precache-v1".into()
}

fn default_runtime_version() -> String {
    "runtime-v1".into()
}

fn default_precache_manifest() -> Vec<String> {
    vec![
        "/".into(),
        "/index.html".into(),
        "/favicon.svg".into(),
        "/icon-192.png".into(),
        "/og-image.png".into(),
    ]
}

fn default_excluded_patterns() -> Vec<String> {
    vec!["supabase.co".into(), "api.resend.com".into(), "/api/".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./cachefront.sqlite")
}

fn default_user_agent() -> String {
    "cachefront/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_body_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_sync_tag() -> String {
    "sync-leads".into()
}

fn default_push_body() -> String {
    "New update available".into()
}

fn default_push_title() -> String {
    "cachefront".into()
}

fn default_push_icon() -> String {
    "/icon-192.png".into()
}

fn default_push_badge() -> String {
    "/favicon.svg".into()
}

fn default_vibration() -> Vec<u32> {
    vec![100, 50, 100]
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            precache_version: default_precache_version(),
            runtime_version: default_runtime_version(),
            precache_manifest: default_precache_manifest(),
            excluded_patterns: default_excluded_patterns(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
            sync_tag: default_sync_tag(),
            push: PushConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CACHEFRONT_`
    /// 2. TOML file from `CACHEFRONT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CACHEFRONT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CACHEFRONT_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.origin, "https://localhost:8080");
        assert_eq!(config.precache_version, "precache-v1");
        assert_eq!(config.runtime_version, "runtime-v1");
        assert_eq!(config.precache_manifest.len(), 5);
        assert!(config.excluded_patterns.contains(&"/api/".to_string()));
        assert_eq!(config.db_path, PathBuf::from("./cachefront.sqlite"));
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.max_body_bytes, 5_242_880);
        assert_eq!(config.sync_tag, "sync-leads");
    }

    #[test]
    fn test_default_push_config() {
        let push = PushConfig::default();
        assert_eq!(push.default_body, "New update available");
        assert_eq!(push.vibration, vec![100, 50, 100]);
    }

    #[test]
    fn test_timeout_duration() {
        let config = ProxyConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }
}
