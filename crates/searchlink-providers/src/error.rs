//! Error types for provider adapters.

use searchlink_engine::ProviderError;

/// Error from an HTTP or local lookup.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed")]
    HttpRequest(#[from] ureq::Error),

    /// Server returned an error status.
    #[error("HTTP error: {status} - {url}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        url: String,
    },

    /// I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

impl From<FetchError> for ProviderError {
    fn from(err: FetchError) -> Self {
        ProviderError::backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::HttpResponse {
            status: 404,
            url: "https://example.com/missing".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP error: 404 - https://example.com/missing");
        let provider: ProviderError = err.into();
        assert!(matches!(provider, ProviderError::Backend(_)));
    }
}
