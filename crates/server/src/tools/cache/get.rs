//! cache_get tool implementation.
//!
//! Retrieves the current store's entry for a request without touching the
//! network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::fetch::resolve;
use swcache_client::{CacheAgent, Network};
use swcache_core::{Error, RequestKey};

use super::super::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached request. Paths starting with `/` are resolved against the site origin.
    pub url: String,

    /// HTTP method of the cached request (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<N: Network>(
    agent: &CacheAgent<N>, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let url = resolve(agent.origin(), &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = RequestKey::new(params.method.as_deref().unwrap_or("GET"), url.as_str());

    let store = agent.db().store(agent.version());
    let entry = store
        .match_request(&key)
        .await?
        .ok_or_else(|| Error::CacheMiss(key.to_string()))?;

    let output = CacheGetOutput {
        store: store.name().to_string(),
        method: key.method,
        url: key.url,
        status: entry.status,
        headers: entry.headers,
        body_bytes: entry.body.len(),
        stored_at: entry.stored_at,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixtures::{output, registered_agent, site};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let agent = registered_agent(site()).await;
        let params = CacheGetParams { url: "/nowhere".to_string(), method: None };

        let err = get_impl(&agent, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let agent = registered_agent(site()).await;
        let params = CacheGetParams { url: "/index.html".to_string(), method: None };

        let result = get_impl(&agent, params).await.unwrap();
        let out: CacheGetOutput = output(&result);
        assert_eq!(out.store, "site-v1");
        assert_eq!(out.url, "http://localhost:8080/index.html");
        assert_eq!(out.status, 200);
        assert_eq!(out.body_bytes, "<h1>index</h1>".len());
    }
}
