//! SQLite-backed versioned cache stores for intercepted responses.
//!
//! This module provides a persistent cache of named stores using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named stores created on demand and deleted wholesale
//! - Entries keyed by request identity (method + URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use hash::RequestKey;
pub use stores::{CacheStore, StoreInfo};
