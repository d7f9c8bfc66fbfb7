//! Configuration validation rules.
//!
//! This module provides validation logic for `ProxyConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::ProxyConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl ProxyConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - the partition version strings are empty or collide
    /// - a manifest entry is not an absolute path
    /// - `max_body_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.origin) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            Ok(parsed) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {}", parsed.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() });
            }
        }

        if self.precache_version.is_empty() {
            return Err(ConfigError::Invalid { field: "precache_version".into(), reason: "must not be empty".into() });
        }
        if self.runtime_version.is_empty() {
            return Err(ConfigError::Invalid { field: "runtime_version".into(), reason: "must not be empty".into() });
        }
        if self.precache_version == self.runtime_version {
            return Err(ConfigError::Invalid {
                field: "runtime_version".into(),
                reason: "must differ from precache_version".into(),
            });
        }

        for path in &self.precache_manifest {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_manifest".into(),
                    reason: format!("entry {path:?} must start with /"),
                });
            }
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_body_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_body_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_body_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.excluded_patterns.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Invalid {
                field: "excluded_patterns".into(),
                reason: "patterns must not be empty".into(),
            });
        }

        Ok(())
    }
}
