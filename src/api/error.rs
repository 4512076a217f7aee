//! Error types for the object API client.

use thiserror::Error;

/// Errors raised while fetching a page of artifact records.
///
/// Every variant carries the page number so a failed run can be replayed
/// from the page that broke.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP request itself failed (DNS, connect, timeout).
    #[error("Request for page {page} failed: {source}")]
    Http {
        page: u64,
        source: reqwest::Error,
    },

    /// The upstream answered with a non-2xx status.
    #[error("Upstream returned {status} for page {page}")]
    Status {
        page: u64,
        status: reqwest::StatusCode,
    },

    /// The response body could not be decoded into a record page.
    #[error("Failed to decode page {page}: {source}")]
    Decode {
        page: u64,
        source: reqwest::Error,
    },
}

impl ApiError {
    /// The page number the error occurred on.
    pub fn page(&self) -> u64 {
        match self {
            Self::Http { page, .. } | Self::Status { page, .. } | Self::Decode { page, .. } => {
                *page
            }
        }
    }

    /// Whether a second attempt at the same page is worthwhile.
    ///
    /// Transport and decode failures are treated as transient. For status
    /// errors only rate limiting (429) and server-side failures (5xx)
    /// qualify; any other 4xx means the request itself is wrong and a
    /// retry would just repeat it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Decode { .. } => true,
            Self::Status { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn status_error(code: u16) -> ApiError {
        ApiError::Status {
            page: 3,
            status: StatusCode::from_u16(code).unwrap(),
        }
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(status_error(429).is_retryable());
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(status_error(500).is_retryable());
        assert!(status_error(502).is_retryable());
        assert!(status_error(503).is_retryable());
    }

    #[test]
    fn test_client_errors_abort() {
        assert!(!status_error(400).is_retryable());
        assert!(!status_error(401).is_retryable());
        assert!(!status_error(404).is_retryable());
    }

    #[test]
    fn test_error_carries_page() {
        assert_eq!(status_error(500).page(), 3);
    }
}
