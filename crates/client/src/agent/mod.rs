//! The caching agent.
//!
//! A [`CacheAgent`] owns one versioned cache store and routes intercepted
//! requests between it and the network. It moves through
//! `Unregistered → Installing → Installed → Activating → Active`; only an
//! active agent intercepts requests, earlier fetches pass straight through.
//!
//! - [`policy`] classifies a request into a [`Strategy`]
//! - [`router`] executes the strategy against network and store
//! - [`lifecycle`] seeds the store on install and purges old versions on activate

pub mod lifecycle;
pub mod policy;
pub mod request;
pub mod router;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, CacheDb, Error};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::{Network, resolve};

pub use lifecycle::{ActivateReport, AgentEvent, EventOutcome, InstallReport};
pub use policy::{RoutePolicy, Strategy};
pub use request::{Destination, Request, Response, ResponseSource, Served};

/// Where the agent is in its install/activate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Unregistered,
    Installing,
    Installed,
    Activating,
    Active,
}

/// Static settings of an agent: its version and what it seeds and serves.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub version: String,
    pub origin: String,
    pub precache: Vec<String>,
    pub offline_fallback: String,
    pub policy: RoutePolicy,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Ok(Self {
            version: config.cache_version.clone(),
            origin: config.origin.clone(),
            precache: config.precache.clone(),
            offline_fallback: config.offline_fallback.clone(),
            policy: RoutePolicy::from_config(config)?,
        })
    }
}

/// Offline caching agent for a single site and cache version.
pub struct CacheAgent<N> {
    db: CacheDb,
    network: N,
    version: String,
    origin: Url,
    precache: Vec<Url>,
    offline_fallback: Url,
    policy: RoutePolicy,
    state: RwLock<LifecycleState>,
}

impl<N: Network> CacheAgent<N> {
    /// Create an unregistered agent. Precache targets and the offline
    /// fallback are resolved against the origin here.
    pub fn new(db: CacheDb, network: N, settings: AgentSettings) -> Result<Self, Error> {
        let origin = Url::parse(&settings.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let resolve_target =
            |target: &str| resolve(&origin, target).map_err(|e| Error::InvalidUrl(format!("{target}: {e}")));

        let precache = settings
            .precache
            .iter()
            .map(|target| resolve_target(target))
            .collect::<Result<Vec<_>, _>>()?;
        let offline_fallback = resolve_target(&settings.offline_fallback)?;

        Ok(Self {
            db,
            network,
            version: settings.version,
            origin,
            precache,
            offline_fallback,
            policy: settings.policy,
            state: RwLock::new(LifecycleState::Unregistered),
        })
    }

    /// Version identifier naming this agent's store.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Answer an intercepted request.
    ///
    /// Returns None when neither the network nor the cache can produce a
    /// response; the caller observes a failed fetch.
    pub async fn handle_fetch(&self, request: &Request) -> Option<Served> {
        if self.state().await != LifecycleState::Active {
            return self.passthrough(request).await;
        }
        self.route(request).await
    }

    async fn passthrough(&self, request: &Request) -> Option<Served> {
        match self.network.fetch(request).await {
            Ok(response) => Some(Served::new(response, ResponseSource::Network)),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "not intercepting; network failed");
                None
            }
        }
    }
}
