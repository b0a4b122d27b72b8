//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the agent's cache stores.

pub mod get;
pub mod stores;

pub use get::{CacheGetParams, get_impl};
pub use stores::stores_impl;
