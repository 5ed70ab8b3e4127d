//! Configuration validation rules.
//!
//! This module provides validation logic for `AgentConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::cache::resolve_asset;
use crate::config::AgentConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AgentConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` or `user_agent` is empty
    /// - `scope` is not an absolute http(s) URL
    /// - an asset is empty, does not resolve, or duplicates another asset
    /// - `timeout_ms` is set outside 100ms..=5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "cache_name".into(), reason: "must not be empty".into() });
        }

        let scope = self.scope_url()?;

        let mut seen = HashSet::new();
        for asset in &self.assets {
            let url = resolve_asset(&scope, asset)
                .map_err(|e| ConfigError::Invalid { field: "assets".into(), reason: e.to_string() })?;
            if !seen.insert(url.clone()) {
                return Err(ConfigError::Invalid {
                    field: "assets".into(),
                    reason: format!("duplicate asset: {url}"),
                });
            }
        }

        if self.assets.is_empty() {
            tracing::warn!("asset manifest is empty; install will only create the generation");
        }

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
