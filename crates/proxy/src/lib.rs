//! Cache-first request proxy for cachefront.
//!
//! This crate provides the interceptor that sits between an
//! application's outgoing requests and the network: scope gating, the
//! cache-first decision pipeline with opportunistic runtime caching,
//! the install/activate lifecycle, and the background-sync and push
//! extension points.

pub mod fetch;
pub mod interceptor;
pub mod push;
pub mod scope;
pub mod sync;

pub use fetch::{Fetch, FetchConfig, FetchResponse, HttpFetcher, Request, UrlError, canonicalize, manifest_url};
pub use interceptor::{CacheProxy, Disposition, ProxyState};
pub use push::{Notification, Notify};
pub use scope::{BypassReason, RequestScope, ScopeDecision};
pub use sync::SyncHandler;
