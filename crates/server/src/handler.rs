//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use precache_client::HttpNetwork;
use precache_core::{CacheAgent, CacheDb};
use url::Url;

use crate::host::ClientRegistry;
use crate::tools::{
    CacheMatchParams, FetchParams,
    cache::{keys_impl, match_impl},
    fetch::fetch_impl,
    lifecycle::{activate_impl, install_impl, status_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The agent as wired by the host binary.
pub type Agent = CacheAgent<CacheDb, HttpNetwork, ClientRegistry>;

/// The main MCP server handler for precache.
#[derive(Clone)]
pub struct PrecacheServer {
    tool_router: ToolRouter<Self>,
    agent: Arc<Agent>,
    network: Arc<HttpNetwork>,
    clients: Arc<ClientRegistry>,
    scope: Url,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PrecacheServer {
    /// Create a new server handler around an agent.
    pub fn new(agent: Arc<Agent>, network: Arc<HttpNetwork>, clients: Arc<ClientRegistry>, scope: Url) -> Self {
        Self { tool_router: Self::tool_router(), agent, network, clients, scope }
    }

    /// Fetch a URL as a controlled page would.
    #[tool(
        description = "Fetch a URL through the offline cache. GET requests are served from cache when present, otherwise fetched and cached. Other methods go straight to the network."
    )]
    async fn fetch(&self, params: Parameters<FetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(self.agent.as_ref(), self.network.as_ref(), &self.scope, params.0).await
    }

    /// Look a URL up in the cache only.
    #[tool(description = "Look up a GET response in the cache without using the network. Fails with CACHE_MISS if absent.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(self.agent.store().as_ref(), &self.scope, params.0).await
    }

    /// List cache generations.
    #[tool(description = "List cache generations with entry counts, marking the current one.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(self.agent.store().as_ref(), self.agent.generation()).await
    }

    /// Re-run the install event.
    #[tool(description = "Re-run install: pre-cache the asset manifest into the current generation.")]
    async fn agent_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(self.agent.as_ref()).await
    }

    /// Re-run the activate event.
    #[tool(description = "Re-run activate: delete stale cache generations and claim clients.")]
    async fn agent_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(self.agent.as_ref()).await
    }

    /// Report lifecycle state.
    #[tool(description = "Report the current generation, lifecycle state, and asset manifest.")]
    async fn agent_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.agent.as_ref(), self.clients.status()).await
    }
}

impl ServerHandler for PrecacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "precache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precache_client::FetchConfig;

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(HttpNetwork::new(FetchConfig::default()).unwrap());
        let clients = Arc::new(ClientRegistry::new());
        let scope = Url::parse("http://localhost:8080/").unwrap();
        let agent = Arc::new(CacheAgent::new("v1", Vec::new(), store, network.clone(), clients.clone()));

        let server = PrecacheServer::new(agent, network, clients, scope);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec!["agent_activate", "agent_install", "agent_status", "cache_keys", "cache_match", "fetch"]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(HttpNetwork::new(FetchConfig::default()).unwrap());
        let clients = Arc::new(ClientRegistry::new());
        let scope = Url::parse("http://localhost:8080/").unwrap();
        let agent = Arc::new(CacheAgent::new("v1", Vec::new(), store, network.clone(), clients.clone()));

        let server = PrecacheServer::new(agent, network, clients, scope);
        assert_eq!(server.get_info().server_info.name, "precache");
    }
}
