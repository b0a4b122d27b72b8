//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

/// Site-relative paths must be absolute; full URLs are allowed as-is.
fn is_site_target(target: &str) -> bool {
    target.starts_with('/') || target.starts_with("http://") || target.starts_with("https://")
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - `cache_version` or `user_agent` is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - a precache entry or `offline_fallback` is neither an absolute path nor a URL
    /// - a static extension contains a dot
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = url::Url::parse(&self.origin).map_err(|e| invalid("origin", e.to_string()))?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme())));
        }

        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if let Some(bad) = self.precache.iter().find(|p| !is_site_target(p)) {
            return Err(invalid("precache", format!("{bad:?} is not an absolute path or URL")));
        }

        if !is_site_target(&self.offline_fallback) {
            return Err(invalid("offline_fallback", "must be an absolute path or URL"));
        }

        if let Some(bad) = self.static_extensions.iter().find(|e| e.is_empty() || e.contains('.')) {
            return Err(invalid("static_extensions", format!("{bad:?} must be a bare extension")));
        }

        if self.precache.is_empty() {
            tracing::warn!("precache list is empty; install will only create the cache store");
        }

        Ok(())
    }
}
