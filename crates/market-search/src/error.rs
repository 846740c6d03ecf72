//! Search error types.

use thiserror::Error;

/// Errors surfaced by a catalog search.
///
/// Malformed URL state never shows up here: the codec normalizes it to
/// defaults. An empty result set is not an error either.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The data source could not be reached (connection refused, timeout, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an error payload.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// The backend answered, but the payload could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Configuration is unusable (missing backend URL, zero page size, ...).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchError {
    /// Message suitable for the error panel.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Transport(_) => {
                "Could not reach the catalog. Check your connection and try again.".to_string()
            }
            SearchError::Backend { status, .. } if *status >= 500 => {
                "The catalog is temporarily unavailable. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Transport(_) => true,
            SearchError::Backend { status, .. } => *status >= 500,
            SearchError::Decode(_) | SearchError::Config(_) => false,
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SearchError::Transport("timeout".into()).is_transient());
        assert!(SearchError::Backend { status: 503, message: String::new() }.is_transient());
        assert!(!SearchError::Backend { status: 400, message: String::new() }.is_transient());
        assert!(!SearchError::Decode("bad".into()).is_transient());
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = SearchError::Transport("tcp connect error: 10.0.0.1:443".into());
        assert!(!err.user_message().contains("10.0.0.1"));

        let err = SearchError::Backend { status: 400, message: "bad column".into() };
        assert!(err.user_message().contains("bad column"));
    }
}
