//! Convenient re-exports for common windowgate types.
pub use crate::{
    clock::{Clock, ManualClock, MonotonicClock},
    config::{LimiterConfig, LimiterConfigBuilder},
    error::ConfigError,
    extract::{self, Extractor},
    rate_limit::{
        FixedWindowLimiter, RateLimitLayer, RateLimitService, RequestTarget, ResponseFuture,
        Verdict, WindowState,
    },
    telemetry::{LogSink, MemorySink, NullSink, RejectionSink},
};
