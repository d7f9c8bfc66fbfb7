//! HTTP fetch backend for the proxy.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Network seam
//! The interceptor talks to the network through the [`Fetch`] trait so
//! tests can substitute a stub backend and count calls. [`HttpFetcher`]
//! is the production implementation over reqwest.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, Url, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize, manifest_url};

use cachefront_core::Error;

/// A request descriptor as seen by the interceptor.
///
/// Carries only what the cache key and the forwarding decision need:
/// method, canonical URL, and any headers to pass upstream.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: header::HeaderMap,
}

impl Request {
    /// A GET request for a canonical URL with no extra headers.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, headers: header::HeaderMap::new() }
    }
}

/// Configuration for the fetch backend.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cachefront/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_body_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "cachefront/0.1".to_string(),
            max_body_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
        }
    }
}

impl FetchConfig {
    /// Derive a fetch configuration from the proxy configuration.
    pub fn from_proxy(config: &cachefront_core::ProxyConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_body_bytes: config.max_body_bytes,
            timeout: config.timeout(),
        }
    }
}

/// Response from a fetch operation.
///
/// Non-success statuses are ordinary responses here; only transport
/// failures surface as errors. The interceptor passes error statuses
/// through to the caller uncached.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds; zero when served from cache
    pub fetch_ms: u64,
}

/// Network seam for the interceptor.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Perform the request against the network.
    ///
    /// # Errors
    ///
    /// Fails only on transport errors or when the body exceeds the
    /// configured size cap. HTTP error statuses are returned as
    /// ordinary responses.
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for std::sync::Arc<T> {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error> {
        (**self).fetch(request).await
    }
}

/// HTTP fetch backend over reqwest.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetch backend with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_body_bytes
        {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", len, self.config.max_body_bytes)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {}", e)))?;

        if body.len() > self.config.max_body_bytes {
            return Err(Error::TooLarge(format!(
                "{} bytes exceeds {}",
                body.len(),
                self.config.max_body_bytes
            )));
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status,
            fetch_ms,
            body.len()
        );

        Ok(FetchResponse { status, content_type, headers, body, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "cachefront/0.1");
        assert_eq!(config.max_body_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
    }

    #[test]
    fn test_fetch_config_from_proxy() {
        let proxy = cachefront_core::ProxyConfig { timeout_ms: 5_000, ..Default::default() };
        let config = FetchConfig::from_proxy(&proxy);
        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert_eq!(config.user_agent, proxy.user_agent);
    }

    #[test]
    fn test_request_get() {
        let request = Request::get(Url::parse("https://example.com/").unwrap());
        assert_eq!(request.method, Method::GET);
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(fetcher.is_ok());
    }
}
