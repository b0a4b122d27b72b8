//! swcache server entry point.
//!
//! Loads configuration, opens the cache database, registers the caching
//! agent (install, then activate) and serves its event surface as MCP tools
//! on stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{AgentSettings, CacheAgent, FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, "starting swcache on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(&FetchConfig::from(&config))?;
    let agent = Arc::new(CacheAgent::new(db, network, AgentSettings::from_config(&config)?)?);

    let (installed, activated) = agent.register().await?;
    tracing::info!(
        cached = installed.cached.len(),
        failed = installed.failed.len(),
        purged = activated.deleted.len(),
        "agent registered"
    );

    let handler = handler::SwCacheServer::new(agent);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
