//! Request-descriptor cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request descriptor.
///
/// The key covers the method and the canonical URL only; bodies and
/// variant headers do not participate. Two requests with the same
/// method and URL always map to the same entry, so concurrent stores
/// for one key resolve by single-key overwrite.
pub fn request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = request_key("GET", "https://example.com/sensor/data");
        let key2 = request_key("GET", "https://example.com/sensor/data");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_method() {
        let get = request_key("GET", "https://example.com/");
        let post = request_key("POST", "https://example.com/");
        assert_ne!(get, post);
    }

    #[test]
    fn test_key_different_url() {
        let root = request_key("GET", "https://example.com/");
        let page = request_key("GET", "https://example.com/index.html");
        assert_ne!(root, page);
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
