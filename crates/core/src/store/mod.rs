//! SQLite-backed partitioned store for response snapshots.
//!
//! This module provides a persistent, origin-scoped response cache using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named cache partitions addressed by version string
//! - Request-descriptor keys via SHA-256 hashing
//! - WAL mode for concurrent access
//! - Partition-level garbage collection for superseded versions

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;

pub use crate::Error;

pub use connection::StoreDb;
pub use entries::StoredResponse;
pub use key::request_key;
