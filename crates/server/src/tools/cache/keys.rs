//! cache_keys tool implementation.
//!
//! Lists generations in the store with their entry counts.

use precache_core::cache::CacheStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// One generation in the store.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    /// True for the generation the agent writes to.
    pub current: bool,
    pub entries: usize,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub generations: Vec<GenerationInfo>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<S: CacheStore>(store: &S, current: &str) -> Result<CallToolResult, McpError> {
    let mut generations = Vec::new();
    for name in store.keys().await? {
        let entries = store.entries(&name).await?.len();
        generations.push(GenerationInfo { current: name == current, name, entries });
    }

    json_result(&CacheKeysOutput { generations })
}
