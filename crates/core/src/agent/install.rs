//! Install: pre-populate the current generation with the asset manifest.

use futures_util::future::try_join_all;
use serde::Serialize;

use super::{CacheAgent, Network, WorkerHost, WorkerState};
use crate::cache::{CacheKey, CacheStore};
use crate::{Error, Request};

/// Result of an install event.
///
/// Install always settles; a failed pre-cache batch is reported here rather
/// than returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub generation: String,
    /// Number of manifest entries stored. Zero when the batch failed.
    pub cached: usize,
    /// Why the batch failed, if it did.
    pub error: Option<String>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

impl<S, N, H> CacheAgent<S, N, H>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    /// Handle the install event.
    ///
    /// Asks the host to skip waiting, then fetches every manifest asset and
    /// stores the batch in the current generation. The batch is all-or-nothing;
    /// its failure is logged and swallowed so registration never fails here.
    pub async fn install(&self) -> InstallReport {
        self.set_state(WorkerState::Installing).await;

        if let Err(e) = self.host.skip_waiting().await {
            tracing::warn!(error = %e, "skip_waiting failed");
        }

        let report = match self.precache().await {
            Ok(cached) => {
                tracing::info!(generation = %self.generation, cached, "pre-cache complete");
                InstallReport { generation: self.generation.clone(), cached, error: None }
            }
            Err(e) => {
                tracing::warn!(generation = %self.generation, error = %e, "pre-cache failed");
                InstallReport { generation: self.generation.clone(), cached: 0, error: Some(e.to_string()) }
            }
        };

        self.set_state(WorkerState::Installed).await;
        report
    }

    async fn precache(&self) -> Result<usize, Error> {
        self.store.open(&self.generation).await?;

        let fetches = self.assets.iter().map(|url| async move {
            let request = Request::get(url.clone());
            let response = self.network.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::BadResponse { url: url.to_string(), status: response.status });
            }
            Ok((CacheKey::for_request(&request), response))
        });

        let entries = try_join_all(fetches).await?;
        let cached = entries.len();
        self.store.put_all(&self.generation, entries).await?;
        Ok(cached)
    }
}
