//! Background eviction of expired windows.
//!
//! Nothing here runs unless asked for: without a sweeper the window map keeps
//! one entry per identity ever seen.

use crate::rate_limit::FixedWindowLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

impl<Req: 'static> FixedWindowLimiter<Req> {
    /// Run [`sweep_expired`](Self::sweep_expired) every `period` on the current tokio runtime.
    ///
    /// The task holds only a weak reference and exits once the limiter is dropped.
    /// Panics if `period` is zero or no runtime is active.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        assert!(period > Duration::ZERO, "sweep period must be non-zero");
        let limiter = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    tracing::debug!("limiter dropped; stopping sweeper");
                    break;
                };
                limiter.sweep_expired();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::ManualClock;
    use crate::telemetry::NullSink;
    use crate::{FixedWindowLimiter, LimiterConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn limiter(clock: ManualClock) -> Arc<FixedWindowLimiter<String>> {
        let config =
            LimiterConfig::new(Duration::from_secs(1), 5, |caller: &String| caller.clone())
                .unwrap();
        Arc::new(FixedWindowLimiter::new(config, NullSink).with_clock(clock))
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_expired_windows() {
        let clock = ManualClock::new();
        let limiter = limiter(clock.clone());
        limiter.decide_identity("a", "/");
        limiter.decide_identity("b", "/");
        assert_eq!(limiter.tracked_identities(), 2);

        clock.advance(Duration::from_secs(2));
        let handle = limiter.spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(limiter.tracked_identities(), 0);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_when_limiter_dropped() {
        let limiter = limiter(ManualClock::new());
        let handle = limiter.spawn_sweeper(Duration::from_millis(10));
        drop(limiter);

        let finished = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(finished.is_ok(), "sweeper should exit after the limiter is dropped");
    }

    #[test]
    #[should_panic(expected = "sweep period must be non-zero")]
    fn zero_period_panics() {
        let limiter = limiter(ManualClock::new());
        let _ = limiter.spawn_sweeper(Duration::ZERO);
    }
}
