//! Request-URL normalization.
//!
//! One resource must map to one cache key, so every URL entering the
//! proxy is normalized the same way before the key is computed: scheme
//! defaulted to https, host lowercased, fragment dropped, query kept
//! as-is. Manifest paths resolve against the configured origin and are
//! canonical by construction.

use std::borrow::Cow;
use url::Url;

/// Error type for URL normalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("non-web scheme: {0}")]
    NonWebScheme(String),

    #[error("unparseable URL: {0}")]
    Unparseable(String),
}

/// Normalize a URL string into the form the cache key consumes.
///
/// Bare hosts ("example.com/page") are taken as https. Fragments never
/// reach the network, so they never reach the key either; the query
/// string does, untouched and unreordered.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme: Cow<'_, str> = if trimmed.contains("://") {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("https://{trimmed}"))
    };

    let mut parsed = Url::parse(&with_scheme).map_err(|e| UrlError::Unparseable(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::NonWebScheme(parsed.scheme().to_string()));
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::Unparseable(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);
    Ok(parsed)
}

/// Resolve an origin-relative manifest path ("/index.html") into the
/// URL that is fetched and keyed at install time.
pub fn manifest_url(origin: &Url, path: &str) -> Result<Url, UrlError> {
    origin
        .join(path)
        .map_err(|e| UrlError::Unparseable(format!("{path}: {e}")))
}
