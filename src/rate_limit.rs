//! Fixed-window rate limiting.
//!
//! This module provides the building blocks for rate limiting:
//! - [`FixedWindowLimiter`]: per-identity window counters and the admit/reject decision.
//! - [`RateLimitLayer`]: Tower middleware that enforces the limit on `http` services.
//! - [`Verdict`]: The result of a decision (Admit/Reject).
//!
//! # Algorithm
//!
//! Each identity owns one [`WindowState`] `{ window_start, count }`:
//! - first request from an identity opens a window with `count = 1` and is admitted;
//! - once `now - window_start` is strictly greater than the window, the next
//!   request opens a fresh window and is admitted;
//! - otherwise the request is admitted while `count < max_requests` (and counted),
//!   and rejected after that without touching the state.
//!
//! A request landing exactly on `window_start + window` still belongs to the old window.
//!
//! # Concurrency
//!
//! One mutex guards the whole identity map for the lookup, comparison and update of a
//! decision. The extractor runs before the lock is taken, and both the rejection sink
//! and the wrapped service run after it is released.

pub mod limiter;
pub mod middleware;
pub mod sweep;
pub mod window;

pub use limiter::FixedWindowLimiter;
pub use middleware::{RateLimitLayer, RateLimitService, ResponseFuture};
pub use window::WindowState;

/// The decision returned by the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The request is forwarded downstream.
    Admit,
    /// The request is answered with `429 Too Many Requests`.
    Reject,
}

impl Verdict {
    /// Helper to check if admitted.
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }

    /// Helper to check if rejected.
    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject)
    }
}

/// Requests that can name their target for rejection notifications.
pub trait RequestTarget {
    /// The target (URL) reported to the rejection sink.
    fn target(&self) -> String;
}

impl<B> RequestTarget for http::Request<B> {
    fn target(&self) -> String {
        self.uri().to_string()
    }
}
