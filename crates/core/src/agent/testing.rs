//! Fakes for the agent's injected capabilities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use url::Url;

use super::{CacheAgent, Network, WorkerHost};
use crate::{Error, MemoryStore, Request, Response};

pub(crate) const SCOPE: &str = "https://maps.example.com/gps/";

pub(crate) fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

/// Network fake serving canned responses and counting calls.
#[derive(Default)]
pub(crate) struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: AtomicUsize,
    offline: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(self, path: &str, response: Response) -> Self {
        self.routes.lock().unwrap().insert(url(path).to_string(), response);
        self
    }

    /// Serve every default manifest asset with a 200.
    pub(crate) fn with_manifest(self) -> Self {
        crate::config::ASSETS
            .iter()
            .fold(self, |net, asset| net.route(asset, Response::new(200, format!("body of {asset}"))))
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Hold every later fetch until the returned gate is notified.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

/// Host fake counting lifecycle calls.
#[derive(Default)]
pub(crate) struct FakeHost {
    pub(crate) skip_waiting: AtomicUsize,
    pub(crate) claims: AtomicUsize,
    pub(crate) fail_claims: AtomicBool,
}

#[async_trait]
impl WorkerHost for FakeHost {
    async fn skip_waiting(&self) -> Result<(), Error> {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), Error> {
        if self.fail_claims.load(Ordering::SeqCst) {
            return Err(Error::InvalidInput("clients unavailable".into()));
        }
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) type TestAgent = CacheAgent<MemoryStore, FakeNetwork, FakeHost>;

/// Build an agent over shared fakes using the default manifest.
pub(crate) fn agent(
    generation: &str, store: &Arc<MemoryStore>, network: &Arc<FakeNetwork>, host: &Arc<FakeHost>,
) -> TestAgent {
    let assets = crate::config::ASSETS.iter().map(|a| url(a)).collect();
    CacheAgent::new(generation, assets, store.clone(), network.clone(), host.clone())
}
