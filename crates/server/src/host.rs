//! Worker host hooks for the stdio server.
//!
//! The server has a single client, the connected MCP peer, so claiming clients
//! amounts to recording that the peer's requests now route through the agent.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use precache_core::{Error, WorkerHost};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Snapshot of host-side lifecycle bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HostStatus {
    /// Whether the agent asked to skip the waiting phase.
    pub skipped_waiting: bool,
    /// How many times the agent has claimed clients.
    pub claims: usize,
}

#[derive(Debug, Default)]
pub struct ClientRegistry {
    skipped_waiting: AtomicBool,
    claims: AtomicUsize,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> HostStatus {
        HostStatus {
            skipped_waiting: self.skipped_waiting.load(Ordering::SeqCst),
            claims: self.claims.load(Ordering::SeqCst),
        }
    }
}

#[async_trait]
impl WorkerHost for ClientRegistry {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skipped_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        let claims = self.claims.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(claims, "claimed clients");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_records_lifecycle() {
        let registry = ClientRegistry::new();
        assert!(!registry.status().skipped_waiting);

        registry.skip_waiting().await.unwrap();
        registry.claim_clients().await.unwrap();
        registry.claim_clients().await.unwrap();

        let status = registry.status();
        assert!(status.skipped_waiting);
        assert_eq!(status.claims, 2);
    }
}
