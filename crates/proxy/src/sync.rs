//! Background-sync extension point.
//!
//! The original proxy recognizes a single sync tag and runs a deferred
//! data-resync when connectivity returns. The resync logic itself
//! belongs to the host application, so it is modeled as a
//! host-supplied handler invoked at most once per trigger, with no
//! retry or backoff.

use async_trait::async_trait;
use cachefront_core::Error;

/// Host-supplied deferred-resync callback.
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// Run the resync once. Invoked only for the configured tag.
    async fn resync(&self) -> Result<(), Error>;
}
