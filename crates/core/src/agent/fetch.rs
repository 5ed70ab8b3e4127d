//! Fetch: cache-first, network fallback, write-through on miss.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{CacheAgent, Network, WorkerHost};
use crate::cache::{CacheKey, CacheStore};
use crate::{Error, Request, Response};

/// What the interceptor decided for one request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Declined: the host performs the request natively, bypassing the cache.
    Passthrough,
    /// Served from the cache without touching the network.
    Cached(Response),
    /// Fetched from the network; a copy is being written to the cache.
    Network { response: Response, write_back: WriteBack },
}

impl FetchOutcome {
    /// The response to hand to the page, if the interceptor produced one.
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Passthrough => None,
            FetchOutcome::Cached(response) | FetchOutcome::Network { response, .. } => Some(response),
        }
    }

    /// Short label for logs and host output.
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Passthrough => "passthrough",
            FetchOutcome::Cached(_) => "cache",
            FetchOutcome::Network { .. } => "network",
        }
    }
}

/// Handle to a detached cache write-back.
///
/// The write runs on its own task whether or not the handle is kept; dropping
/// it does not cancel the write. Awaiting [`WriteBack::settled`] observes the
/// outcome.
#[derive(Debug)]
pub struct WriteBack {
    handle: JoinHandle<Result<(), Error>>,
}

impl WriteBack {
    fn spawn<S: CacheStore>(store: Arc<S>, generation: String, key: CacheKey, response: Response) -> Self {
        let handle = tokio::spawn(async move {
            let label = key.to_string();
            let result = store.put(&generation, key, response).await;
            match &result {
                Ok(()) => tracing::debug!("stored {} in {}", label, generation),
                Err(e) => tracing::warn!(key = %label, error = %e, "cache write-back failed"),
            }
            result
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the write to finish.
    ///
    /// # Errors
    ///
    /// Returns the store error, or `Error::WriteBack` if the task panicked.
    pub async fn settled(self) -> Result<(), Error> {
        self.handle.await.map_err(|e| Error::WriteBack(e.to_string()))?
    }
}

impl<S, N, H> CacheAgent<S, N, H>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    /// Handle an intercepted request.
    ///
    /// Non-GET requests pass through untouched. A GET is answered from any
    /// generation in the store when possible; otherwise it goes to the network
    /// and a copy of the response is written to the current generation in the
    /// background. There is no freshness check and no request coalescing.
    ///
    /// # Errors
    ///
    /// Returns the network error when a miss cannot be fetched, or a store
    /// error if the lookup itself fails.
    pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !request.is_get() {
            tracing::debug!("passing through {} {}", request.method, request.url);
            return Ok(FetchOutcome::Passthrough);
        }

        let key = CacheKey::for_request(request);

        if let Some(cached) = self.store.match_request(&key).await? {
            tracing::debug!("cache hit for {}", key);
            return Ok(FetchOutcome::Cached(cached));
        }

        tracing::debug!("cache miss for {}", key);
        let response = self.network.fetch(request).await?;

        let copy = response.clone();
        let write_back = WriteBack::spawn(self.store.clone(), self.generation.clone(), key, copy);

        Ok(FetchOutcome::Network { response, write_back })
    }
}
