//! Activate: sweep stale generations, then claim clients.

use futures_util::future::join_all;
use serde::Serialize;

use super::{CacheAgent, Network, WorkerHost, WorkerState};
use crate::Error;
use crate::cache::CacheStore;

/// Result of an activate event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub generation: String,
    /// Generations removed by the sweep.
    pub deleted: Vec<String>,
}

impl<S, N, H> CacheAgent<S, N, H>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    /// Handle the activate event.
    ///
    /// Deletes every generation other than the current one, waits for all
    /// deletions to settle, then claims clients. A failed deletion is logged and
    /// does not stop the sweep.
    ///
    /// # Errors
    ///
    /// Returns an error if generations cannot be listed or clients cannot be
    /// claimed. The lifecycle state is then restored to what it was before.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let previous = self.state().await;
        self.set_state(WorkerState::Activating).await;

        match self.sweep_and_claim().await {
            Ok(deleted) => {
                self.set_state(WorkerState::Activated).await;
                self.mark_controlling();
                tracing::info!(generation = %self.generation, deleted = deleted.len(), "activated");
                Ok(ActivateReport { generation: self.generation.clone(), deleted })
            }
            Err(e) => {
                tracing::warn!(generation = %self.generation, error = %e, "activation failed");
                self.set_state(previous).await;
                Err(e)
            }
        }
    }

    async fn sweep_and_claim(&self) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != self.generation)
            .collect();

        let results = join_all(stale.iter().map(|name| self.store.delete(name))).await;

        let mut deleted = Vec::with_capacity(stale.len());
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => {
                    tracing::debug!("deleted stale generation {}", name);
                    deleted.push(name);
                }
                Ok(false) => tracing::debug!("stale generation {} already gone", name),
                Err(e) => tracing::warn!(generation = %name, error = %e, "failed to delete stale generation"),
            }
        }

        self.host.claim_clients().await?;
        Ok(deleted)
    }
}
