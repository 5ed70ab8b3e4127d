//! cache_match tool implementation.
//!
//! Looks a URL up in the cache without falling back to the network.

use precache_core::cache::{CacheStore, resolve_asset};
use precache_core::{CacheKey, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HostError;
use crate::tools::fetch::HeaderParam;
use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL, or a path relative to the agent's scope.
    pub url: String,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub key: String,
    pub status: u16,
    pub headers: Vec<HeaderParam>,
    pub body_bytes: usize,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<S: CacheStore>(
    store: &S, scope: &Url, params: CacheMatchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(HostError::InvalidInput("url cannot be empty".into()).into());
    }

    let url = resolve_asset(scope, &params.url).map_err(|e| HostError::InvalidUrl(e.to_string()))?;
    let key = CacheKey::get(url);
    let response = store
        .match_request(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheMatchOutput {
        key: key.to_string(),
        status: response.status,
        headers: response
            .headers
            .into_iter()
            .map(|(name, value)| HeaderParam { name, value })
            .collect(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}
