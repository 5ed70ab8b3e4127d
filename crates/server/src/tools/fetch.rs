//! fetch tool implementation.
//!
//! Dispatches a request the way a controlled page would: through the agent
//! once it is activated, natively otherwise.

use precache_core::cache::{CacheStore, resolve_asset};
use precache_core::{CacheAgent, FetchOutcome, Network, Request, Response, WorkerHost};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;
use crate::error::HostError;

/// A single header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderParam {
    pub name: String,
    pub value: String,
}

/// Parameters for the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Absolute URL, or a path relative to the agent's scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers.
    #[serde(default)]
    pub headers: Vec<HeaderParam>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    pub method: String,
    /// Where the response came from: cache, network, passthrough, or uncontrolled.
    pub source: String,
    pub status: u16,
    pub headers: Vec<HeaderParam>,
    /// Body as UTF-8 text, when it is valid UTF-8.
    pub body: Option<String>,
    pub body_bytes: usize,
}

impl FetchOutput {
    fn new(request: &Request, source: &str, response: &Response) -> Self {
        Self {
            url: request.url.to_string(),
            method: request.method.clone(),
            source: source.to_string(),
            status: response.status,
            headers: response
                .headers
                .iter()
                .map(|(name, value)| HeaderParam { name: name.clone(), value: value.clone() })
                .collect(),
            body: std::str::from_utf8(&response.body).ok().map(str::to_string),
            body_bytes: response.body.len(),
        }
    }
}

fn build_request(scope: &Url, params: FetchParams) -> Result<Request, HostError> {
    if params.url.trim().is_empty() {
        return Err(HostError::InvalidInput("url cannot be empty".into()));
    }
    if params.method.trim().is_empty() {
        return Err(HostError::InvalidInput("method cannot be empty".into()));
    }

    let url = resolve_asset(scope, &params.url).map_err(|e| HostError::InvalidUrl(e.to_string()))?;
    let request = params
        .headers
        .into_iter()
        .fold(Request::new(params.method.trim(), url), |req, h| req.with_header(h.name, h.value));
    Ok(request)
}

/// Implementation of the fetch tool.
pub async fn fetch_impl<S, N, H>(
    agent: &CacheAgent<S, N, H>, network: &N, scope: &Url, params: FetchParams,
) -> Result<CallToolResult, McpError>
where
    S: CacheStore,
    N: Network,
    H: WorkerHost,
{
    let request = build_request(scope, params)?;

    if !agent.is_controlling() {
        tracing::debug!("agent not active, fetching {} natively", request.url);
        let response = network.fetch(&request).await?;
        return json_result(&FetchOutput::new(&request, "uncontrolled", &response));
    }

    let outcome = agent.fetch(&request).await?;
    let output = match &outcome {
        FetchOutcome::Passthrough => {
            let response = network.fetch(&request).await?;
            FetchOutput::new(&request, outcome.source(), &response)
        }
        FetchOutcome::Cached(response) | FetchOutcome::Network { response, .. } => {
            FetchOutput::new(&request, outcome.source(), response)
        }
    };

    json_result(&output)
}
