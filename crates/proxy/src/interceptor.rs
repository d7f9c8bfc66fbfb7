//! The cache proxy: lifecycle, decision pipeline, and host triggers.
//!
//! One proxy instance sits between the application's outgoing requests
//! and the network. Its life runs `Installing → Installed → Activating
//! → Active`; once active it answers intercepts cache-first, dispatches
//! background-sync triggers, and turns push payloads into
//! notifications.
//!
//! Concurrent intercepts share no in-memory mutable state: everything
//! shared lives in the store, whose writes are per-key atomic. Two
//! racing fetches for one key both store; last write wins, which is
//! harmless because stored values for a key are equivalent.

use std::sync::Arc;

use cachefront_core::store::request_key;
use cachefront_core::{Error, ProxyConfig, StoreDb, StoredResponse};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::fetch::{Fetch, FetchResponse, Request, manifest_url};
use crate::push::{Notification, Notify};
use crate::scope::{BypassReason, RequestScope, ScopeDecision};
use crate::sync::SyncHandler;

/// Lifecycle state of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Installing,
    Installed,
    Activating,
    Active,
}

/// How an intercepted request was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Out of scope; forwarded to the network untouched.
    Bypass(BypassReason),
    /// Served from the named cache partition, zero network calls.
    Hit { partition: String },
    /// Fetched from the network and stored in the runtime partition.
    MissStored,
    /// Fetched from the network; not cacheable (non-200 status).
    MissUncached,
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Bypass(reason) => write!(f, "bypass ({reason})"),
            Disposition::Hit { partition } => write!(f, "hit ({partition})"),
            Disposition::MissStored => write!(f, "miss, stored"),
            Disposition::MissUncached => write!(f, "miss, not cached"),
        }
    }
}

/// Cache-first request proxy over a partitioned response store.
pub struct CacheProxy<F: Fetch> {
    store: StoreDb,
    fetcher: F,
    scope: RequestScope,
    config: ProxyConfig,
    origin: Url,
    state: ProxyState,
    sync_handler: Option<Arc<dyn SyncHandler>>,
    notifier: Option<Arc<dyn Notify>>,
}

impl<F: Fetch> CacheProxy<F> {
    /// Create a proxy in the `Installing` state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the configured origin does not parse.
    pub fn new(store: StoreDb, fetcher: F, config: ProxyConfig) -> Result<Self, Error> {
        let scope = RequestScope::new(&config)?;
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            store,
            fetcher,
            scope,
            config,
            origin,
            state: ProxyState::Installing,
            sync_handler: None,
            notifier: None,
        })
    }

    /// Register the host's deferred-resync handler.
    pub fn with_sync_handler(mut self, handler: Arc<dyn SyncHandler>) -> Self {
        self.sync_handler = Some(handler);
        self
    }

    /// Register the host's notification surface.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notify>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProxyState {
        self.state
    }

    /// The store backing this proxy.
    pub fn store(&self) -> &StoreDb {
        &self.store
    }

    /// Populate the precache partition from the configured manifest.
    ///
    /// When the partition already holds every manifest entry (a warm
    /// store from a previous run under the same version), the manifest
    /// fetch is skipped entirely so the proxy can come up offline.
    /// Otherwise the precache is atomic: every manifest entry is
    /// fetched first, and any transport failure or non-success status
    /// aborts the install with nothing written. A previously active
    /// version keeps serving from its own partitions in that case.
    pub async fn install(&mut self) -> Result<(), Error> {
        if self.state != ProxyState::Installing {
            return Err(Error::Lifecycle(format!("install called in state {:?}", self.state)));
        }

        let mut manifest = Vec::with_capacity(self.config.precache_manifest.len());
        for path in &self.config.precache_manifest {
            let url = manifest_url(&self.origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            manifest.push((path.as_str(), Request::get(url)));
        }

        if self.precache_is_populated(&manifest).await? {
            tracing::info!(
                partition = %self.config.precache_version,
                "precache already populated, skipping manifest fetch"
            );
            self.state = ProxyState::Installed;
            return Ok(());
        }

        let mut staged = Vec::with_capacity(manifest.len());
        for (path, request) in &manifest {
            let response = self
                .fetcher
                .fetch(request)
                .await
                .map_err(|e| Error::InstallFailed(format!("{path}: {e}")))?;
            if !response.status.is_success() {
                return Err(Error::InstallFailed(format!("{path} returned {}", response.status)));
            }
            staged.push(stored_from(request, &response));
        }

        for entry in &staged {
            self.store.put(&self.config.precache_version, entry).await?;
        }

        tracing::info!(
            partition = %self.config.precache_version,
            entries = staged.len(),
            "precache installed"
        );
        self.state = ProxyState::Installed;
        Ok(())
    }

    /// True when the current precache partition already holds every
    /// manifest entry.
    async fn precache_is_populated(&self, manifest: &[(&str, Request)]) -> Result<bool, Error> {
        for (_, request) in manifest {
            let key = request_key(request.method.as_str(), request.url.as_str());
            if !self.store.contains(&self.config.precache_version, &key).await? {
                return Ok(false);
            }
        }
        Ok(!manifest.is_empty())
    }

    /// Garbage-collect partitions from superseded versions and go active.
    ///
    /// Every partition whose name is neither the current precache
    /// version nor the current runtime version is deleted; the two
    /// current partitions (if present) survive.
    pub async fn activate(&mut self) -> Result<(), Error> {
        if self.state != ProxyState::Installed {
            return Err(Error::Lifecycle(format!("activate called in state {:?}", self.state)));
        }
        self.state = ProxyState::Activating;

        let deleted = self
            .store
            .retain_partitions(&[&self.config.precache_version, &self.config.runtime_version])
            .await?;
        for name in &deleted {
            tracing::info!(partition = %name, "deleted superseded partition");
        }

        self.state = ProxyState::Active;
        Ok(())
    }

    /// Handle one intercepted request.
    ///
    /// Decision order is fixed: scope gate, cache-first lookup
    /// (precache before runtime), network fallback with opportunistic
    /// store. Transport failures propagate unchanged; no retry, no
    /// synthetic fallback response.
    pub async fn intercept(&self, request: &Request) -> Result<(FetchResponse, Disposition), Error> {
        if self.state != ProxyState::Active {
            return Err(Error::Lifecycle(format!("intercept called in state {:?}", self.state)));
        }

        if let ScopeDecision::Bypass(reason) = self.scope.classify(request) {
            tracing::debug!(url = %request.url, %reason, "bypassing cache");
            let response = self.fetcher.fetch(request).await?;
            return Ok((response, Disposition::Bypass(reason)));
        }

        let key = request_key(request.method.as_str(), request.url.as_str());
        let partitions = [self.config.precache_version.as_str(), self.config.runtime_version.as_str()];
        if let Some((partition, entry)) = self.store.get_first(&partitions, &key).await? {
            tracing::debug!(url = %request.url, %partition, "cache hit");
            return Ok((response_from(&entry)?, Disposition::Hit { partition }));
        }

        let response = self.fetcher.fetch(request).await?;
        if response.status == StatusCode::OK {
            let entry = stored_from(request, &response);
            self.store.put(&self.config.runtime_version, &entry).await?;
            tracing::debug!(url = %request.url, "cache miss, stored");
            return Ok((response, Disposition::MissStored));
        }

        tracing::debug!(url = %request.url, status = %response.status, "cache miss, not cacheable");
        Ok((response, Disposition::MissUncached))
    }

    /// Handle a background-sync trigger.
    ///
    /// Runs the registered handler once if the tag matches the
    /// configured one; unrecognized tags are ignored. Returns whether
    /// the handler ran.
    pub async fn sync(&self, tag: &str) -> Result<bool, Error> {
        if tag != self.config.sync_tag {
            tracing::debug!(%tag, "ignoring unrecognized sync tag");
            return Ok(false);
        }
        match &self.sync_handler {
            Some(handler) => {
                handler.resync().await?;
                Ok(true)
            }
            None => {
                tracing::debug!(%tag, "sync tag recognized but no handler registered");
                Ok(false)
            }
        }
    }

    /// Handle an incoming push payload.
    ///
    /// Builds a notification (default body when the payload is absent
    /// or unreadable) and displays it through the registered notifier,
    /// if any.
    pub async fn push(&self, payload: Option<&[u8]>) -> Result<Notification, Error> {
        let notification = Notification::from_payload(&self.config, payload)?;
        if let Some(notifier) = &self.notifier {
            notifier.show(&notification).await?;
        }
        Ok(notification)
    }

    /// Handle a click on a previously shown notification: dismiss it,
    /// then focus or open the origin's root page.
    pub async fn notification_click(&self, notification: &Notification) -> Result<(), Error> {
        if let Some(notifier) = &self.notifier {
            notifier.dismiss(notification).await?;
            let root = self
                .origin
                .join("/")
                .map_err(|e| Error::InvalidUrl(e.to_string()))?;
            notifier.open(&root).await?;
        }
        Ok(())
    }
}

/// Snapshot a fetched response for storage, keyed by its request.
fn stored_from(request: &Request, response: &FetchResponse) -> StoredResponse {
    StoredResponse {
        key: request_key(request.method.as_str(), request.url.as_str()),
        method: request.method.to_string(),
        url: request.url.to_string(),
        status: response.status.as_u16(),
        content_type: response.content_type.clone(),
        headers_json: headers_to_json(&response.headers),
        body: response.body.to_vec(),
        stored_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Rehydrate a stored entry into a servable response.
fn response_from(entry: &StoredResponse) -> Result<FetchResponse, Error> {
    let status = StatusCode::from_u16(entry.status)
        .map_err(|_| Error::CorruptEntry(format!("invalid status {}", entry.status)))?;
    Ok(FetchResponse {
        status,
        content_type: entry.content_type.clone(),
        headers: headers_from_json(entry.headers_json.as_deref()),
        body: bytes::Bytes::from(entry.body.clone()),
        fetch_ms: 0,
    })
}

// Pair list rather than a map: repeated headers (Set-Cookie, Vary)
// must survive the round trip.
fn headers_to_json(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<(String, String)> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    if pairs.is_empty() {
        None
    } else {
        serde_json::to_string(&pairs).ok()
    }
}

fn headers_from_json(json: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(json) = json else {
        return headers;
    };
    let Ok(pairs) = serde_json::from_str::<Vec<(String, String)>>(json) else {
        return headers;
    };
    for (name, value) in pairs {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
            headers.append(name, value);
        }
    }
    headers
}
