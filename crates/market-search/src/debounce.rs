//! Clock-injected debouncing.
//!
//! `Debouncer` holds at most one pending value and releases it once the
//! window has elapsed since the most recent push. It never reads the clock
//! itself, so it can be driven by a UI event loop, a tokio timer, or a test.

use std::time::Duration;

use tokio::time::Instant;

/// Debounce window for free-text input.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace the pending value and restart the window. Returns the new deadline.
    pub fn push(&mut self, value: T, now: Instant) -> Instant {
        let deadline = now + self.window;
        self.pending = Some((value, deadline));
        deadline
    }

    /// Release the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// When the pending value becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    /// The pending value, without releasing it.
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    /// Release the pending value immediately (e.g. on explicit submit).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    /// Drop the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_releases_after_window() {
        let start = Instant::now();
        let mut d = Debouncer::default();
        d.push("sh", start);

        assert_eq!(d.poll(start + ms(299)), None);
        assert_eq!(d.poll(start + ms(300)), Some("sh"));
        assert_eq!(d.poll(start + ms(400)), None);
    }

    #[test]
    fn test_each_push_restarts_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(ms(300));
        d.push("s", start);
        d.push("sh", start + ms(200));
        d.push("shoe", start + ms(400));

        assert_eq!(d.poll(start + ms(650)), None);
        assert_eq!(d.deadline(), Some(start + ms(700)));
        assert_eq!(d.poll(start + ms(700)), Some("shoe"));
    }

    #[test]
    fn test_flush_and_cancel() {
        let start = Instant::now();
        let mut d = Debouncer::default();
        d.push(1, start);
        assert_eq!(d.peek(), Some(&1));
        assert_eq!(d.flush(), Some(1));
        assert!(!d.is_pending());

        d.push(2, start);
        d.cancel();
        assert_eq!(d.poll(start + ms(1_000)), None);
    }
}
