//! Shared fakes for tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use precache_core::{CacheAgent, Error, MemoryStore, Network, Request, Response};
use rmcp::model::CallToolResult;
use url::Url;

use crate::host::ClientRegistry;

pub(crate) const SCOPE: &str = "https://maps.example.com/gps/";

pub(crate) type TestAgent = CacheAgent<MemoryStore, StubNetwork, ClientRegistry>;

pub(crate) fn scope() -> Url {
    Url::parse(SCOPE).unwrap()
}

/// Network stub answering from a fixed route table; unknown URLs fail like an offline fetch.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: HashMap<String, Response>,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub(crate) fn route(mut self, path: &str, response: Response) -> Self {
        self.routes.insert(scope().join(path).unwrap().to_string(), response);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.routes
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

pub(crate) fn agent(assets: &[&str], network: StubNetwork) -> (Arc<TestAgent>, Arc<StubNetwork>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let network = Arc::new(network);
    let assets = assets.iter().map(|a| scope().join(a).unwrap()).collect();
    let agent = CacheAgent::new("test-v1", assets, store.clone(), network.clone(), Arc::new(ClientRegistry::new()));
    (Arc::new(agent), network, store)
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
