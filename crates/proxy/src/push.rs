//! Push message handling and notification presentation.
//!
//! A push payload carries at most a plain text body. Everything else
//! shown to the user (title, icon, badge, vibration) is fixed by
//! configuration, and a missing or unreadable payload falls back to
//! the configured default body rather than failing.

use async_trait::async_trait;
use cachefront_core::{Error, ProxyConfig};
use url::Url;

/// A user-visible notification derived from a push payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Url,
    pub badge: Url,
    pub vibration: Vec<u32>,
}

impl Notification {
    /// Build a notification from an optional push payload.
    ///
    /// The body is the payload's UTF-8 text; an absent or non-UTF-8
    /// payload yields the configured default body. Icon and badge
    /// paths resolve against the configured origin.
    pub fn from_payload(config: &ProxyConfig, payload: Option<&[u8]>) -> Result<Self, Error> {
        let body = payload
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .filter(|text| !text.trim().is_empty())
            .map(|text| text.to_string())
            .unwrap_or_else(|| config.push.default_body.clone());

        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let icon = origin
            .join(&config.push.icon)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let badge = origin
            .join(&config.push.badge)
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            title: config.push.title.clone(),
            body,
            icon,
            badge,
            vibration: config.push.vibration.clone(),
        })
    }
}

/// Host-supplied notification surface.
///
/// The proxy decides what to show and when to dismiss; how the
/// notification reaches the user is the host's concern.
#[async_trait]
pub trait Notify: Send + Sync {
    /// Display a notification.
    async fn show(&self, notification: &Notification) -> Result<(), Error>;

    /// Dismiss a previously shown notification.
    async fn dismiss(&self, notification: &Notification) -> Result<(), Error>;

    /// Focus an open page at the URL, or open one.
    async fn open(&self, url: &Url) -> Result<(), Error>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_from_text_payload() {
        let config = ProxyConfig::default();
        let notification = Notification::from_payload(&config, Some(b"Deploy finished".as_slice())).unwrap();
        assert_eq!(notification.body, "Deploy finished");
        assert_eq!(notification.vibration, vec![100, 50, 100]);
    }

    #[test]
    fn test_notification_missing_payload_uses_default() {
        let config = ProxyConfig::default();
        let notification = Notification::from_payload(&config, None).unwrap();
        assert_eq!(notification.body, "New update available");
    }

    #[test]
    fn test_notification_invalid_utf8_uses_default() {
        let config = ProxyConfig::default();
        let notification = Notification::from_payload(&config, Some([0xff, 0xfe].as_slice())).unwrap();
        assert_eq!(notification.body, "New update available");
    }

    #[test]
    fn test_notification_blank_payload_uses_default() {
        let config = ProxyConfig::default();
        let notification = Notification::from_payload(&config, Some(b"   ".as_slice())).unwrap();
        assert_eq!(notification.body, "New update available");
    }

    #[test]
    fn test_notification_icon_resolved_against_origin() {
        let config = ProxyConfig { origin: "https://example.com".into(), ..Default::default() };
        let notification = Notification::from_payload(&config, None).unwrap();
        assert_eq!(notification.icon.as_str(), "https://example.com/icon-192.png");
        assert_eq!(notification.badge.as_str(), "https://example.com/favicon.svg");
    }
}
