//! precache host entry point.
//!
//! Boots the cache agent, runs install then activate, and serves the MCP
//! tools on stdio transport. Logging goes to stderr to avoid interfering with
//! the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use precache_client::{FetchConfig, HttpNetwork};
use precache_core::{AgentConfig, CacheAgent, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AgentConfig::load()?;
    tracing::info!(generation = %config.cache_name, scope = %config.scope, "starting precache host on stdio transport");

    let store = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(HttpNetwork::new(FetchConfig::from(&config))?);
    let clients = Arc::new(host::ClientRegistry::new());
    let agent = Arc::new(CacheAgent::from_config(&config, store, network.clone(), clients.clone())?);

    let install = agent.install().await;
    if !install.is_complete() {
        tracing::warn!("starting with an incomplete pre-cache; offline coverage is reduced");
    }
    agent.activate().await?;

    let handler = handler::PrecacheServer::new(agent, network, clients, config.scope_url()?);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
