//! Lifecycle tools: re-run install/activate and report agent status.

use precache_core::cache::CacheStore;
use precache_core::{CacheAgent, Network, WorkerHost, WorkerState};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::host::HostStatus;

/// Output from the agent_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusOutput {
    pub generation: String,
    /// One of parsed, installing, installed, activating, activated.
    pub state: String,
    /// Whether client fetches are routed through the agent.
    pub controlling: bool,
    pub assets: Vec<String>,
    pub host: HostStatus,
}

fn state_label(state: WorkerState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{state:?}"))
}

/// Implementation of the agent_install tool.
pub async fn install_impl<S, N, H>(agent: &CacheAgent<S, N, H>) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    let report = agent.install().await;
    json_result(&report)
}

/// Implementation of the agent_activate tool.
pub async fn activate_impl<S, N, H>(agent: &CacheAgent<S, N, H>) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    let report = agent.activate().await?;
    json_result(&report)
}

/// Implementation of the agent_status tool.
pub async fn status_impl<S, N, H>(agent: &CacheAgent<S, N, H>, host: HostStatus) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    let output = StatusOutput {
        generation: agent.generation().to_string(),
        state: state_label(agent.state().await),
        controlling: agent.is_controlling(),
        assets: agent.assets().iter().map(|u| u.to_string()).collect(),
        host,
    };
    json_result(&output)
}
