//! Unified error types for cachework.

/// Unified error types for the caching worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unparseable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network request exceeded the hard timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Network-level failure (connect, TLS, read).
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Response arrived but with a non-success status.
    #[error("HTTP_ERROR: status {0}")]
    HttpStatus(u16),

    /// No cache entry found for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),
}

impl Error {
    /// True for failures a strategy recovers from by falling back to
    /// cache or the offline document.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FetchTimeout(_) | Error::FetchFailed(_) | Error::HttpStatus(_) | Error::CacheMiss(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("abc123".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::FetchTimeout("5s".into()).is_recoverable());
        assert!(Error::HttpStatus(503).is_recoverable());
        assert!(!Error::InvalidUrl("nope".into()).is_recoverable());
    }
}
