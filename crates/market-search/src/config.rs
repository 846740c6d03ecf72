//! Search session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::pagination::PAGE_SIZE;
use crate::url_sync::HistoryMode;

/// Tunables of a search session. Every field has a default, so an empty
/// `[search]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Free-text debounce window in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// How URL rewrites are recorded in history.
    #[serde(default)]
    pub history_mode: HistoryMode,

    /// Path of the search page.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_path() -> String {
    "/search".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            history_mode: HistoryMode::default(),
            path: default_path(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.page_size == 0 {
            return Err(SearchError::Config("page_size must be at least 1".into()));
        }
        if !self.path.starts_with('/') {
            return Err(SearchError::Config(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.history_mode, HistoryMode::Replace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"page_size": 24, "history_mode": "push"}"#).unwrap();
        assert_eq!(config.page_size, 24);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.history_mode, HistoryMode::Push);
    }

    #[test]
    fn test_validate() {
        let config = SearchConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SearchConfig {
            path: "search".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
