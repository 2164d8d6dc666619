#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # windowgate
//!
//! Per-identity, fixed-window request rate limiting for `http` services, as
//! Tower middleware.
//!
//! ## Features
//!
//! - **Fixed-window counters** keyed by a caller identity you choose
//! - **Tower layer** that answers over-limit requests with `429 Too Many Requests`
//! - **Pluggable identity extraction** (header, peer address, or any closure)
//! - **Rejection sinks** for logging or recording throttled callers
//! - **Injectable clock** for deterministic tests
//! - **Optional sweeper** that evicts expired windows
//!
//! ## Quick Start
//!
//! ```rust
//! use windowgate::{extract, FixedWindowLimiter, LimiterConfig, RateLimitLayer};
//! use windowgate::telemetry::LogSink;
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use tower::{service_fn, ServiceBuilder, ServiceExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = LimiterConfig::builder()
//!         .window(Duration::from_secs(60))
//!         .max_requests(3)
//!         .shared_extractor(extract::peer_addr::<String>())
//!         .build()
//!         .expect("valid limiter config");
//!
//!     let svc = ServiceBuilder::new()
//!         .layer(RateLimitLayer::new(FixedWindowLimiter::new(config, LogSink)))
//!         .service(service_fn(|_req: http::Request<String>| async {
//!             Ok::<_, Infallible>(http::Response::new(String::from("ok")))
//!         }));
//!
//!     let response = svc.oneshot(http::Request::new(String::new())).await.unwrap();
//!     assert_eq!(response.status(), http::StatusCode::OK);
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod prelude;
pub mod rate_limit;
pub mod telemetry;

// Re-exports
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{LimiterConfig, LimiterConfigBuilder};
pub use error::ConfigError;
pub use extract::Extractor;
pub use rate_limit::{
    FixedWindowLimiter, RateLimitLayer, RateLimitService, RequestTarget, Verdict, WindowState,
};
pub use telemetry::RejectionSink;

#[cfg(feature = "serde")]
pub use config::LimitSettings;
