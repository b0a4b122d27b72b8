//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache stores with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheStore, RequestKey, StoreInfo, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
