//! Per-identity window state and the fixed-window step.

use std::time::Duration;

/// Counting state for one identity.
///
/// `count` is in `[1, max(max_requests, 1)]` at all times; rejected requests
/// never increment it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    window_start: Duration,
    count: u8,
}

/// What a single step did to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Window fully elapsed; restarted at `now` with count 1.
    Reset,
    /// Counted against the current window.
    Counted,
    /// Window already holds `max_requests`; state untouched.
    Exhausted,
}

impl WindowState {
    /// Open a window at `now` holding the first request.
    pub(crate) fn open(now: Duration) -> Self {
        Self { window_start: now, count: 1 }
    }

    /// Clock reading at which this window started.
    pub fn window_start(&self) -> Duration {
        self.window_start
    }

    /// Requests admitted in this window.
    pub fn count(&self) -> u8 {
        self.count
    }

    /// True once strictly more than `window` has passed since the window started.
    pub fn is_expired(&self, now: Duration, window: Duration) -> bool {
        now.saturating_sub(self.window_start) > window
    }

    /// Apply one request arriving at `now`.
    pub(crate) fn step(&mut self, now: Duration, window: Duration, max_requests: u8) -> Step {
        if self.is_expired(now, window) {
            *self = Self::open(now);
            return Step::Reset;
        }
        if self.count < max_requests {
            self.count += 1;
            return Step::Counted;
        }
        Step::Exhausted
    }
}
