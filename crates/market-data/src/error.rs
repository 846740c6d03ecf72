//! HTTP client error types.

use market_search::SearchError;
use thiserror::Error;

/// Errors that can occur when making HTTP requests.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Failed to send the request.
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Failed to parse response body.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request timeout.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else if e.is_decode() {
            FetchError::ParseError(e.to_string())
        } else {
            FetchError::RequestError(e.to_string())
        }
    }
}

impl From<FetchError> for SearchError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::RequestError(msg) => SearchError::Transport(msg),
            FetchError::Timeout => SearchError::Transport("request timed out".to_string()),
            FetchError::InvalidUrl(msg) => SearchError::Config(format!("invalid backend url: {}", msg)),
            FetchError::HttpError { status, message } => SearchError::Backend { status, message },
            FetchError::ParseError(msg) => SearchError::Decode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_into_search_error() {
        assert!(matches!(
            SearchError::from(FetchError::Timeout),
            SearchError::Transport(_)
        ));
        assert_eq!(
            SearchError::from(FetchError::HttpError {
                status: 404,
                message: "missing".into()
            }),
            SearchError::Backend {
                status: 404,
                message: "missing".into()
            }
        );
        assert!(matches!(
            SearchError::from(FetchError::ParseError("eof".into())),
            SearchError::Decode(_)
        ));
    }
}
