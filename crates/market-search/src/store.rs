//! Observable filter store.
//!
//! Handed to whoever needs it instead of living in a global. Built on a
//! `watch` channel: readers always see the latest state and are woken only
//! when it actually changes.

use tokio::sync::watch;

use crate::filter::{FilterPatch, FilterState};

#[derive(Debug)]
pub struct FilterStore {
    tx: watch::Sender<FilterState>,
}

impl FilterStore {
    pub fn new(initial: FilterState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> FilterState {
        self.tx.borrow().clone()
    }

    /// Shallow-merge a patch and return the resulting state.
    pub fn set(&self, patch: FilterPatch) -> FilterState {
        self.update(|state| state.apply(patch))
    }

    /// Mutate in place. `f` reports whether it changed anything; subscribers
    /// are notified only if it did.
    pub fn update<F>(&self, f: F) -> FilterState
    where
        F: FnOnce(&mut FilterState) -> bool,
    {
        self.tx.send_if_modified(f);
        self.get()
    }

    /// Replace the whole state (e.g. after URL navigation).
    pub fn replace(&self, state: FilterState) -> FilterState {
        self.update(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterState> {
        self.tx.subscribe()
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_merges_and_returns_state() {
        let store = FilterStore::default();
        let state = store.set(FilterPatch::query_text("shoe"));
        assert_eq!(state.query_text(), "shoe");
        assert_eq!(store.get(), state);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = FilterStore::default();
        let mut rx = store.subscribe();

        store.set(FilterPatch::location("Lagos"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().location(), "Lagos");
    }

    #[test]
    fn test_no_op_does_not_notify() {
        let store = FilterStore::new(FilterState::new().with_query("shoe"));
        let rx = store.subscribe();

        store.set(FilterPatch::query_text("shoe"));
        assert!(!rx.has_changed().unwrap());

        store.update(|s| s.toggle_category("Fashion"));
        assert!(rx.has_changed().unwrap());
    }
}
