//! Scope gating: which requests the proxy intercepts at all.
//!
//! A request is classified before any cache or network activity, in a
//! fixed order: origin check, then method check, then exclusion check.
//! Anything that fails a check passes through to the network untouched,
//! and an excluded URL is additionally never written back to cache.

use cachefront_core::ProxyConfig;
use reqwest::Method;
use url::Url;

use crate::fetch::Request;

/// Why a request bypassed the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// URL origin differs from the proxy's own origin.
    CrossOrigin,
    /// Method is not GET.
    NonGet,
    /// URL matches an excluded dynamic-backend pattern.
    Excluded,
}

impl std::fmt::Display for BypassReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BypassReason::CrossOrigin => write!(f, "cross-origin"),
            BypassReason::NonGet => write!(f, "non-GET"),
            BypassReason::Excluded => write!(f, "excluded pattern"),
        }
    }
}

/// Outcome of the scope gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Eligible for cache-first handling.
    Cacheable,
    /// Forward to the network untouched.
    Bypass(BypassReason),
}

/// Classifies requests against the proxy's origin and exclusion list.
#[derive(Debug, Clone)]
pub struct RequestScope {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    excluded_patterns: Vec<String>,
}

impl RequestScope {
    /// Build the scope gate from an already-validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the configured origin does not parse.
    pub fn new(config: &ProxyConfig) -> Result<Self, cachefront_core::Error> {
        let origin = Url::parse(&config.origin).map_err(|e| cachefront_core::Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            scheme: origin.scheme().to_string(),
            host: origin.host_str().map(|h| h.to_lowercase()),
            port: origin.port(),
            excluded_patterns: config.excluded_patterns.clone(),
        })
    }

    /// True when the URL shares the proxy's scheme, host, and port.
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
            && url.host_str().map(|h| h.to_lowercase()) == self.host
            && url.port() == self.port
    }

    /// True when the URL contains any excluded pattern substring.
    ///
    /// Exclusion applies regardless of method, so dynamic backend calls
    /// are never served stale.
    pub fn is_excluded(&self, url: &Url) -> bool {
        let url_str = url.as_str();
        self.excluded_patterns.iter().any(|pattern| url_str.contains(pattern))
    }

    /// Classify a request: origin check, then method check, then
    /// exclusion check, in that order.
    pub fn classify(&self, request: &Request) -> ScopeDecision {
        if !self.is_same_origin(&request.url) {
            return ScopeDecision::Bypass(BypassReason::CrossOrigin);
        }
        if request.method != Method::GET {
            return ScopeDecision::Bypass(BypassReason::NonGet);
        }
        if self.is_excluded(&request.url) {
            return ScopeDecision::Bypass(BypassReason::Excluded);
        }
        ScopeDecision::Cacheable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> RequestScope {
        let config = ProxyConfig { origin: "https://example.com".into(), ..Default::default() };
        RequestScope::new(&config).unwrap()
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_same_origin_get_is_cacheable() {
        assert_eq!(scope().classify(&get("https://example.com/sensor/data")), ScopeDecision::Cacheable);
    }

    #[test]
    fn test_cross_origin_bypasses() {
        assert_eq!(
            scope().classify(&get("https://other.com/page")),
            ScopeDecision::Bypass(BypassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_scheme_mismatch_is_cross_origin() {
        assert_eq!(
            scope().classify(&get("http://example.com/page")),
            ScopeDecision::Bypass(BypassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_port_mismatch_is_cross_origin() {
        assert_eq!(
            scope().classify(&get("https://example.com:8443/page")),
            ScopeDecision::Bypass(BypassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_host_case_is_ignored() {
        assert_eq!(scope().classify(&get("https://EXAMPLE.com/page")), ScopeDecision::Cacheable);
    }

    #[test]
    fn test_non_get_bypasses() {
        let mut request = get("https://example.com/contact");
        request.method = Method::POST;
        assert_eq!(scope().classify(&request), ScopeDecision::Bypass(BypassReason::NonGet));
    }

    #[test]
    fn test_excluded_path_segment_bypasses() {
        assert_eq!(
            scope().classify(&get("https://example.com/api/contacts")),
            ScopeDecision::Bypass(BypassReason::Excluded)
        );
    }

    #[test]
    fn test_origin_check_precedes_exclusion() {
        // A cross-origin backend URL reports CrossOrigin, not Excluded.
        assert_eq!(
            scope().classify(&get("https://db.supabase.co/rest/v1/leads")),
            ScopeDecision::Bypass(BypassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_method_check_precedes_exclusion() {
        let mut request = get("https://example.com/api/contacts");
        request.method = Method::POST;
        assert_eq!(scope().classify(&request), ScopeDecision::Bypass(BypassReason::NonGet));
    }
}
