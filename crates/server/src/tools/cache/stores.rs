//! cache_stores tool implementation.
//!
//! Lists every cache store and marks the one the agent serves from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{CacheAgent, LifecycleState, Network};
use swcache_core::{RequestKey, StoreInfo};

use super::super::json_result;

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Version identifier of the agent's store.
    pub current: String,
    /// Lifecycle state of the agent.
    pub state: LifecycleState,
    /// All stores, oldest first.
    pub stores: Vec<StoreInfo>,
    /// Requests cached in the agent's store, ordered by URL.
    pub current_keys: Vec<RequestKey>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl<N: Network>(agent: &CacheAgent<N>) -> Result<CallToolResult, McpError> {
    let stores = agent.db().stores().await?;
    let current_keys = agent.db().store(agent.version()).keys().await?;
    let output =
        CacheStoresOutput { current: agent.version().to_string(), state: agent.state().await, stores, current_keys };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fixtures::{agent, output, site};

    #[tokio::test]
    async fn test_stores_before_and_after_activation() {
        let agent = agent(site()).await;
        agent.db().open_store("site-v0").await.unwrap();

        let out: CacheStoresOutput = output(&stores_impl(&agent).await.unwrap());
        assert_eq!(out.state, LifecycleState::Unregistered);
        assert_eq!(out.stores.len(), 1);
        assert!(out.current_keys.is_empty());

        agent.register().await.unwrap();

        let out: CacheStoresOutput = output(&stores_impl(&agent).await.unwrap());
        assert_eq!(out.current, "site-v1");
        assert_eq!(out.state, LifecycleState::Active);
        assert_eq!(out.stores.len(), 1);
        assert_eq!(out.stores[0].name, "site-v1");
        assert_eq!(out.stores[0].entries, 3);
        let urls: Vec<&str> = out.current_keys.iter().map(|key| key.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://localhost:8080/", "http://localhost:8080/index.html", "http://localhost:8080/version.json"]
        );
    }
}
