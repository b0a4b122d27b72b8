//! In-memory network and agent fixtures for tests.
//!
//! Compiled for this crate's tests and, with the `testing` feature, for
//! downstream crates' tests.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use swcache_core::{AppConfig, CacheDb, Error};
use url::Url;

use super::{AgentSettings, CacheAgent, Request, Response};
use crate::fetch::Network;

pub const ORIGIN: &str = "http://localhost:8080";

pub fn origin_url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Site double: serves registered bodies, 404 for everything else.
pub struct MemoryNetwork {
    routes: Mutex<HashMap<String, (String, Bytes)>>,
    unreachable: Mutex<HashSet<String>>,
    online: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(HashSet::new()),
            online: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn serve(&self, path: &str, content_type: &str, body: &str) {
        self.serve_url(origin_url(path).as_str(), content_type, body);
    }

    pub fn serve_url(&self, url: &str, content_type: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (content_type.to_string(), Bytes::from(body.to_string())));
    }

    /// Make one path fail at the transport level.
    pub fn fail(&self, path: &str) {
        self.unreachable.lock().unwrap().insert(origin_url(path).to_string());
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Network for MemoryNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if !self.online.load(Ordering::SeqCst) || self.unreachable.lock().unwrap().contains(&url) {
            return Err(Error::HttpError(format!("network error: {url} unreachable")));
        }

        let route = self.routes.lock().unwrap().get(&url).cloned();
        let mut headers = HeaderMap::new();
        let (status, body) = match route {
            Some((content_type, body)) => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());
                (StatusCode::OK, body)
            }
            None => (StatusCode::NOT_FOUND, Bytes::from_static(b"not found")),
        };

        Ok(Response { url: request.url.clone(), status, headers, body })
    }
}

/// Holds every fetch of one URL until released; other URLs go straight through.
pub struct GatedNetwork {
    inner: Arc<MemoryNetwork>,
    held: String,
    reached: Notify,
    released: Notify,
}

impl GatedNetwork {
    pub fn new(inner: Arc<MemoryNetwork>, path: &str) -> Self {
        Self { inner, held: origin_url(path).to_string(), reached: Notify::new(), released: Notify::new() }
    }

    /// Wait until a fetch of the held URL is parked at the gate.
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait::async_trait]
impl Network for GatedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        if request.url.as_str() == self.held {
            self.reached.notify_one();
            self.released.notified().await;
        }
        self.inner.fetch(request).await
    }
}

pub fn settings() -> AgentSettings {
    settings_for("test-v1")
}

pub fn settings_for(version: &str) -> AgentSettings {
    let config = AppConfig { origin: ORIGIN.into(), cache_version: version.into(), ..Default::default() };
    AgentSettings::from_config(&config).unwrap()
}

/// Unregistered agent over an in-memory store.
pub async fn agent(network: Arc<MemoryNetwork>) -> CacheAgent<Arc<MemoryNetwork>> {
    agent_over(network).await
}

/// Unregistered agent over any network double.
pub async fn agent_over<N: Network>(network: N) -> CacheAgent<N> {
    let db = CacheDb::open_in_memory().await.unwrap();
    CacheAgent::new(db, network, settings()).unwrap()
}

/// Installed and activated agent.
pub async fn active_agent(network: Arc<MemoryNetwork>) -> CacheAgent<Arc<MemoryNetwork>> {
    let agent = agent(network).await;
    agent.install().await.unwrap();
    agent.activate().await.unwrap();
    agent
}
