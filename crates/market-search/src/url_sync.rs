//! Keeps the address bar and the filter state in step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::filter::FilterState;

/// How a URL rewrite lands in browser history. Neither reloads the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    #[default]
    Replace,
    Push,
}

/// A pending address-bar rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlUpdate {
    pub href: String,
    pub mode: HistoryMode,
}

#[derive(Debug, Clone)]
pub struct UrlSynchronizer {
    path: String,
    mode: HistoryMode,
    last_written: Option<String>,
}

impl UrlSynchronizer {
    pub fn new(path: impl Into<String>, mode: HistoryMode) -> Self {
        Self {
            path: path.into(),
            mode,
            last_written: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Initial state from the URL the page was loaded with.
    pub fn on_mount(&mut self, query: &str) -> FilterState {
        self.adopt(query)
    }

    /// State for a back/forward navigation. The browser already shows this
    /// URL, so the next commit of the same state writes nothing.
    pub fn on_navigate(&mut self, query: &str) -> FilterState {
        self.adopt(query)
    }

    /// The rewrite needed to reflect `state`, if the visible URL differs.
    pub fn commit(&mut self, state: &FilterState) -> Option<UrlUpdate> {
        let href = codec::to_href(&self.path, state);
        if self.last_written.as_deref() == Some(href.as_str()) {
            return None;
        }
        debug!(href = %href, "url updated");
        self.last_written = Some(href.clone());
        Some(UrlUpdate {
            href,
            mode: self.mode,
        })
    }

    /// The href most recently written or adopted.
    pub fn current_href(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    fn adopt(&mut self, query: &str) -> FilterState {
        let state = codec::from_query_string(query);
        // Remember what the address bar shows: a non-canonical URL then
        // differs from the next commit and gets rewritten exactly once.
        let canonical = codec::to_href(&self.path, &state);
        let visible = match query.strip_prefix('?').unwrap_or(query) {
            "" => self.path.clone(),
            qs => format!("{}?{}", self.path, qs),
        };
        if canonical != visible {
            debug!(visible = %visible, canonical = %canonical, "normalizing url state");
        }
        self.last_written = Some(visible);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_then_commit_same_state_writes_nothing() {
        let mut sync = UrlSynchronizer::new("/search", HistoryMode::Replace);
        let state = sync.on_mount("?q=shoe");
        assert_eq!(state.query_text(), "shoe");
        assert_eq!(sync.commit(&state), None);
    }

    #[test]
    fn test_commit_writes_on_change() {
        let mut sync = UrlSynchronizer::new("/search", HistoryMode::Push);
        let mut state = sync.on_mount("");
        state.toggle_category("Electronics");
        state.toggle_category("Fashion");

        let update = sync.commit(&state).expect("url should change");
        assert_eq!(update.href, "/search?categories=Electronics,Fashion");
        assert_eq!(update.mode, HistoryMode::Push);
        assert_eq!(sync.commit(&state), None);
    }

    #[test]
    fn test_malformed_url_is_rewritten_once() {
        let mut sync = UrlSynchronizer::new("/search", HistoryMode::Replace);
        let state = sync.on_mount("?minPrice=abc&q=lamp");
        let update = sync.commit(&state).expect("canonical rewrite");
        assert_eq!(update.href, "/search?q=lamp");
        assert_eq!(sync.commit(&state), None);
    }

    #[test]
    fn test_clearing_filters_returns_bare_path() {
        let mut sync = UrlSynchronizer::new("/search", HistoryMode::Replace);
        let mut state = sync.on_mount("?q=shoe");
        state.clear();
        let update = sync.commit(&state).expect("cleared");
        assert_eq!(update.href, "/search");
    }

    #[test]
    fn test_navigate_adopts_url() {
        let mut sync = UrlSynchronizer::new("/search", HistoryMode::Push);
        let state = sync.on_mount("?q=a");
        let mut next = state.clone();
        next.set_query_text("b");
        sync.commit(&next);

        let back = sync.on_navigate("?q=a");
        assert_eq!(back, state);
        assert_eq!(sync.commit(&back), None);
        assert_eq!(sync.current_href(), Some("/search?q=a"));
    }
}
