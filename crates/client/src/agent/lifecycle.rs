//! Install and activate handling, and event dispatch.
//!
//! The agent skips both waiting phases: a freshly installed agent may be
//! activated at once, and an activated agent routes every request from then
//! on without waiting for a previous agent to let go.

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use swcache_core::{CacheStore, Error};
use tokio::task::JoinHandle;
use url::Url;

use super::{CacheAgent, Destination, LifecycleState, Request, Served};
use crate::fetch::Network;

/// Lifecycle signals delivered to the agent.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Install,
    Activate,
    Fetch(Request),
}

/// Result of a handled event.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Fetched(Option<Served>),
}

/// What install managed to seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallReport {
    pub version: String,
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Stores removed by activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
}

impl<N: Network> CacheAgent<N> {
    /// Seed the current-version store with the precache list.
    ///
    /// Assets are fetched concurrently and each one may fail on its own;
    /// partial population still completes the install. Only a store that
    /// cannot be opened fails the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let previous = self
            .transition(&[LifecycleState::Unregistered, LifecycleState::Installed, LifecycleState::Active], |s| {
                if s == LifecycleState::Active { s } else { LifecycleState::Installing }
            })
            .await?;
        tracing::info!(version = %self.version, "installing");

        let store = match self.db.open_store(&self.version).await {
            Ok(store) => store,
            Err(e) => {
                *self.state.write().await = previous;
                return Err(e);
            }
        };

        let outcomes = join_all(self.precache.iter().map(|url| self.precache_one(&store, url))).await;

        let mut report = InstallReport { version: self.version.clone(), cached: Vec::new(), failed: Vec::new() };
        for (url, ok) in self.precache.iter().zip(outcomes) {
            if ok {
                report.cached.push(url.to_string());
            } else {
                report.failed.push(url.to_string());
            }
        }

        if !report.failed.is_empty() {
            tracing::debug!(failed = report.failed.len(), "some assets failed to cache during install");
        }

        if previous != LifecycleState::Active {
            *self.state.write().await = LifecycleState::Installed;
        }
        tracing::info!(version = %self.version, cached = report.cached.len(), "installed; skipping wait");

        Ok(report)
    }

    async fn precache_one(&self, store: &CacheStore, url: &Url) -> bool {
        let request = Request::get(url.clone()).with_destination(Destination::Document);
        let response = match self.network.fetch(&request).await {
            Ok(response) if response.status.is_success() => response,
            Ok(response) => {
                tracing::debug!(%url, status = response.status.as_u16(), "precache skipped");
                return false;
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "precache fetch failed");
                return false;
            }
        };

        match store.put(&request.key(), &response.snapshot()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%url, error = %e, "precache write failed");
                false
            }
        }
    }

    /// Delete every store not named after the current version, then claim
    /// all requests.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let previous = self
            .transition(&[LifecycleState::Installed, LifecycleState::Active], |s| {
                if s == LifecycleState::Active { s } else { LifecycleState::Activating }
            })
            .await?;

        let deleted = match self.purge_other_versions().await {
            Ok(deleted) => deleted,
            Err(e) => {
                *self.state.write().await = previous;
                return Err(e);
            }
        };

        *self.state.write().await = LifecycleState::Active;
        tracing::info!(version = %self.version, purged = deleted.len(), "activated; claiming requests");

        Ok(ActivateReport { version: self.version.clone(), deleted })
    }

    async fn purge_other_versions(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.db.store_names().await? {
            if name != self.version && self.db.delete_store(&name).await? {
                tracing::debug!(store = %name, "deleted old cache store");
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Install, then activate at once.
    pub async fn register(&self) -> Result<(InstallReport, ActivateReport), Error> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Handle one event to completion.
    pub async fn handle(&self, event: AgentEvent) -> Result<EventOutcome, Error> {
        match event {
            AgentEvent::Install => self.install().await.map(EventOutcome::Installed),
            AgentEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            AgentEvent::Fetch(request) => Ok(EventOutcome::Fetched(self.handle_fetch(&request).await)),
        }
    }

    /// Move to the next state if the current one allows it.
    ///
    /// Returns the state the agent was in before the move.
    async fn transition(
        &self, allowed: &[LifecycleState], next: impl FnOnce(LifecycleState) -> LifecycleState,
    ) -> Result<LifecycleState, Error> {
        let mut state = self.state.write().await;
        let current = *state;
        if !allowed.contains(&current) {
            return Err(Error::InvalidState(format!("agent {} is {:?}", self.version, current)));
        }
        *state = next(current);
        Ok(current)
    }
}

impl<N: Network + 'static> CacheAgent<N> {
    /// Run an event on its own task.
    ///
    /// The returned handle is the completion token: the event counts as
    /// handled once it resolves.
    pub fn dispatch(self: &Arc<Self>, event: AgentEvent) -> JoinHandle<Result<EventOutcome, Error>> {
        let agent = Arc::clone(self);
        tokio::spawn(async move { agent.handle(event).await })
    }
}
