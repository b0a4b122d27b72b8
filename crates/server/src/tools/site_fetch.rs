//! site_fetch tool implementation.
//!
//! Delivers a fetch event to the agent and reports which response it chose.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::fetch::resolve;
use swcache_client::{AgentEvent, CacheAgent, Destination, EventOutcome, Network, Request, ResponseSource};
use swcache_core::Error;

use super::json_result;
use crate::error::ToolError;

/// Input parameters for the site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchParams {
    /// URL to fetch. Paths starting with `/` are resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination, e.g. "document" or "image" (default: document).
    #[serde(default = "default_destination")]
    pub destination: Destination,
}

fn default_method() -> String {
    "GET".into()
}

fn default_destination() -> Destination {
    Destination::Document
}

/// Output structure for the site_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SiteFetchOutput {
    /// URL of the response.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Where the response came from.
    pub source: ResponseSource,
    /// Response headers as name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    /// Body size in bytes.
    pub body_bytes: usize,
}

/// Implementation of the site_fetch tool.
pub async fn fetch_impl<N: Network + 'static>(
    agent: &Arc<CacheAgent<N>>, params: SiteFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let request = if params.url.trim_start().starts_with('/') {
        let url = resolve(agent.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Request::parse(&params.method, url.as_str(), params.destination)?
    } else {
        Request::parse(&params.method, &params.url, params.destination)?
    };

    let outcome = agent
        .dispatch(AgentEvent::Fetch(request.clone()))
        .await
        .map_err(ToolError::from)??;

    let served = match outcome {
        EventOutcome::Fetched(Some(served)) => served,
        _ => return Err(Error::NoResponse(format!("{} {}", request.method, request.url)).into()),
    };

    let response = served.response;
    let output = SiteFetchOutput {
        url: response.url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type().map(str::to_string),
        source: served.source,
        headers: response.snapshot().headers,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}
