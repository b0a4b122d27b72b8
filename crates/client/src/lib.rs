//! Client code for swcache.
//!
//! This crate provides the network fetch client and the caching agent that
//! routes intercepted requests between the network and the cache store.

pub mod agent;
pub mod fetch;

pub use agent::{
    ActivateReport, AgentEvent, AgentSettings, CacheAgent, Destination, EventOutcome, InstallReport, LifecycleState,
    Request, Response, ResponseSource, RoutePolicy, Served, Strategy,
};

pub use fetch::{FetchClient, FetchConfig, Network};
