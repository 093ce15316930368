//! Trailing-edge debounce for search box input.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Default quiet interval before typed text becomes the effective query.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// What: Trailing-edge debounce with a single pending slot.
///
/// Details:
/// - Every [`Debouncer::input`] replaces the pending text and restarts the
///   timer; the previous timer is gone, not merely ignored.
/// - [`Debouncer::fired`] is cancel-safe: the pending value is only taken
///   once its deadline passed, so it can sit in a `select!` loop.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(Instant, String)>,
}

impl Debouncer {
    /// Debouncer firing after `delay` of quiet.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record new input and restart the timer.
    pub fn input(&mut self, text: &str) {
        self.pending = Some((Instant::now() + self.delay, text.to_string()));
    }

    /// Take the pending text immediately, skipping the wait.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(_, text)| text)
    }

    /// Drop the pending text and its timer.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a timer is running.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// What: Wait for the pending timer and return its text.
    ///
    /// Output:
    /// - The last input once `delay` elapsed without further input; never
    ///   resolves while nothing is pending.
    pub async fn fired(&mut self) -> String {
        let Some((deadline, _)) = &self.pending else {
            return std::future::pending().await;
        };
        let deadline = *deadline;
        sleep_until(deadline).await;
        self.pending
            .take()
            .map(|(_, text)| text)
            .unwrap_or_default()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
