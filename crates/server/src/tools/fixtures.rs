//! Agent fixtures shared by the tool tests.

use rmcp::model::CallToolResult;
use std::sync::Arc;
use swcache_client::CacheAgent;
use swcache_client::agent::testing::{MemoryNetwork, settings_for};
use swcache_core::CacheDb;

/// Home, index, version manifest and one stylesheet; 404 for the rest.
pub fn site() -> Arc<MemoryNetwork> {
    let network = MemoryNetwork::new();
    network.serve("/", "text/html", "<h1>home</h1>");
    network.serve("/index.html", "text/html", "<h1>index</h1>");
    network.serve("/version.json", "application/json", "{\"version\":\"1\"}");
    network.serve("/assets/site.css", "text/css", "body{margin:0}");
    Arc::new(network)
}

pub async fn agent(network: Arc<MemoryNetwork>) -> Arc<CacheAgent<Arc<MemoryNetwork>>> {
    let db = CacheDb::open_in_memory().await.unwrap();
    Arc::new(CacheAgent::new(db, network, settings_for("site-v1")).unwrap())
}

pub async fn registered_agent(network: Arc<MemoryNetwork>) -> Arc<CacheAgent<Arc<MemoryNetwork>>> {
    let agent = agent(network).await;
    agent.register().await.unwrap();
    agent
}

/// Parse the JSON text of the first content item.
pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
