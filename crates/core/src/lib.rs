//! Core types and shared functionality for cachefront.
//!
//! This crate provides:
//! - Partitioned response store with SQLite backend
//! - Unified error types
//! - Proxy configuration structures

pub mod config;
pub mod error;
pub mod store;

pub use config::ProxyConfig;
pub use error::Error;
pub use store::{StoreDb, StoredResponse};
