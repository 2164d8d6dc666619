//! The per-identity fixed-window limiter.

use crate::clock::{Clock, MonotonicClock};
use crate::config::LimiterConfig;
use crate::rate_limit::window::{Step, WindowState};
use crate::rate_limit::{RequestTarget, Verdict};
use crate::telemetry::{notify_isolated, RejectionSink};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fixed-window limiter keyed by caller identity.
///
/// Entries are created lazily and never removed by [`decide`](Self::decide), so
/// the map grows with the number of distinct identities seen. Long-running
/// processes can bound it with [`sweep_expired`](Self::sweep_expired) or
/// [`spawn_sweeper`](Self::spawn_sweeper).
pub struct FixedWindowLimiter<Req> {
    config: LimiterConfig<Req>,
    windows: Mutex<HashMap<String, WindowState>>,
    sink: Arc<dyn RejectionSink>,
    clock: Arc<dyn Clock>,
}

impl<Req> fmt::Debug for FixedWindowLimiter<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedWindowLimiter")
            .field("config", &self.config)
            .field("tracked_identities", &self.tracked_identities())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<Req> FixedWindowLimiter<Req> {
    /// Create a limiter that reports rejections to `sink`.
    ///
    /// # Examples
    /// ```
    /// use windowgate::{FixedWindowLimiter, LimiterConfig, Verdict};
    /// use windowgate::telemetry::LogSink;
    /// use std::time::Duration;
    ///
    /// let config = LimiterConfig::new(Duration::from_secs(60), 1, |caller: &String| caller.clone())
    ///     .unwrap();
    /// let limiter = FixedWindowLimiter::new(config, LogSink);
    /// assert_eq!(limiter.decide_identity("a", "/"), Verdict::Admit);
    /// assert_eq!(limiter.decide_identity("a", "/"), Verdict::Reject);
    /// ```
    pub fn new<S>(config: LimiterConfig<Req>, sink: S) -> Self
    where
        S: RejectionSink + 'static,
    {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            sink: Arc::new(sink),
            clock: Arc::new(MonotonicClock::default()),
        }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &LimiterConfig<Req> {
        &self.config
    }

    /// Decide whether `req` may proceed.
    ///
    /// The identity comes from the configured extractor. On [`Verdict::Reject`]
    /// the rejection sink is notified with the identity and the request target
    /// before this returns.
    pub fn decide(&self, req: &Req) -> Verdict
    where
        Req: RequestTarget,
    {
        let identity = self.config.identify(req);
        self.decide_with(&identity, || req.target())
    }

    /// Decide for an already extracted identity.
    pub fn decide_identity(&self, identity: &str, target: &str) -> Verdict {
        self.decide_with(identity, || target)
    }

    // The target is only rendered when there is a rejection to report.
    fn decide_with<T, F>(&self, identity: &str, target: F) -> Verdict
    where
        T: AsRef<str>,
        F: FnOnce() -> T,
    {
        let verdict = self.apply(identity);
        if verdict.is_reject() {
            notify_isolated(self.sink.as_ref(), identity, target().as_ref());
        }
        verdict
    }

    /// Current window of `identity`, if it has been seen.
    pub fn window_state(&self, identity: &str) -> Option<WindowState> {
        self.lock_windows().get(identity).copied()
    }

    /// Number of identities currently holding a window.
    pub fn tracked_identities(&self) -> usize {
        self.lock_windows().len()
    }

    /// Drop every window that has fully elapsed; returns how many were removed.
    ///
    /// A dropped identity is indistinguishable from one whose window expired:
    /// its next request opens a fresh window.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window();
        let removed = {
            let mut windows = self.lock_windows();
            let before = windows.len();
            windows.retain(|_, state| !state.is_expired(now, window));
            before - windows.len()
        };
        if removed > 0 {
            tracing::info!(removed, "swept expired rate limit windows");
        }
        removed
    }

    // The whole lookup/compare/update runs under one lock; nothing else is
    // called while it is held.
    fn apply(&self, identity: &str) -> Verdict {
        let window = self.config.window();
        let max_requests = self.config.max_requests();
        let step = {
            let mut windows = self.lock_windows();
            let now = self.clock.now();
            match windows.get_mut(identity) {
                Some(state) => Some(state.step(now, window, max_requests)),
                None => {
                    windows.insert(identity.to_string(), WindowState::open(now));
                    None
                }
            }
        };

        match step {
            None => {
                tracing::debug!(identity, "opened rate limit window");
                Verdict::Admit
            }
            Some(Step::Reset) => {
                tracing::debug!(identity, "rate limit window reset");
                Verdict::Admit
            }
            Some(Step::Counted) => Verdict::Admit,
            Some(Step::Exhausted) => Verdict::Reject,
        }
    }

    // Every mutation is a single whole-value write, so a poisoned map is still consistent.
    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, WindowState>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
