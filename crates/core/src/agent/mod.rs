//! The cache agent: install, activate, and fetch entry points.
//!
//! The agent owns no cache state of its own beyond the current generation
//! name. Storage, network access, and client control are injected as
//! capabilities ([`CacheStore`], [`Network`], [`WorkerHost`]) so that the host
//! decides what backs them. Each entry point is an independent async
//! operation; the host is responsible for running install before activate and
//! activate before routing client fetches through [`CacheAgent::fetch`].

mod activate;
mod fetch;
mod install;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::cache::{CacheStore, resolve_asset};
use crate::config::{AgentConfig, ConfigError};
use crate::{Error, Request, Response};

pub use activate::ActivateReport;
pub use fetch::{FetchOutcome, WriteBack};
pub use install::InstallReport;

/// Network access used for pre-caching and cache misses.
#[async_trait]
pub trait Network: Send + Sync + 'static {
    /// Perform the request. Any HTTP status is a successful fetch; only
    /// transport failures are errors.
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Lifecycle hooks offered by the environment running the agent.
#[async_trait]
pub trait WorkerHost: Send + Sync + 'static {
    /// Make this version eligible for activation without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open client in scope.
    async fn claim_clients(&self) -> Result<(), Error>;
}

/// Lifecycle position of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// Cache-first request interception policy bound to one cache generation.
pub struct CacheAgent<S, N, H> {
    generation: String,
    assets: Vec<Url>,
    store: Arc<S>,
    network: Arc<N>,
    host: Arc<H>,
    state: RwLock<WorkerState>,
    controlling: AtomicBool,
}

impl<S, N, H> CacheAgent<S, N, H>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    /// Create an agent for `generation` that pre-caches `assets` (already resolved).
    pub fn new(generation: impl Into<String>, assets: Vec<Url>, store: Arc<S>, network: Arc<N>, host: Arc<H>) -> Self {
        Self {
            generation: generation.into(),
            assets,
            store,
            network,
            host,
            state: RwLock::new(WorkerState::Parsed),
            controlling: AtomicBool::new(false),
        }
    }

    /// Create an agent from loaded configuration, resolving the manifest against the scope.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope or an asset does not resolve.
    pub fn from_config(config: &AgentConfig, store: Arc<S>, network: Arc<N>, host: Arc<H>) -> Result<Self, ConfigError> {
        let scope = config.scope_url()?;
        let assets = config
            .assets
            .iter()
            .map(|asset| resolve_asset(&scope, asset))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::Invalid { field: "assets".into(), reason: e.to_string() })?;

        Ok(Self::new(config.cache_name.clone(), assets, store, network, host))
    }

    /// Name of the current cache generation.
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Resolved asset manifest.
    pub fn assets(&self) -> &[Url] {
        &self.assets
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// True once an activation has completed and client fetches should be intercepted.
    ///
    /// Stays set for the life of the agent; a later install or a failed
    /// re-activation does not release clients already under control.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::Acquire)
    }

    fn mark_controlling(&self) {
        self.controlling.store(true, Ordering::Release);
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        tracing::debug!(generation = %self.generation, from = ?*state, to = ?next, "worker state change");
        *state = next;
    }
}
