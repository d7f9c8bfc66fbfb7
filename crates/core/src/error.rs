//! Unified error types for cachefront.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cachefront proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be rehydrated into a response.
    #[error("store error: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Precache install aborted because a manifest entry was unreachable.
    #[error("install failed: {0}")]
    InstallFailed(String),

    /// Network transport failure during a fetch.
    #[error("network error: {0}")]
    Network(String),

    /// Fetch response exceeded the configured body-size cap.
    #[error("response too large: {0}")]
    TooLarge(String),

    /// Operation attempted in the wrong lifecycle state.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InstallFailed("/favicon.svg returned 404".to_string());
        assert!(err.to_string().contains("install failed"));
        assert!(err.to_string().contains("favicon"));
    }

    #[test]
    fn test_network_error_display() {
        let err = Error::Network("connection refused".to_string());
        assert!(err.to_string().starts_with("network error"));
    }
}
