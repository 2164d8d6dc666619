//! Error types for limiter construction.
//!
//! The decision path itself never fails: every request gets a [`Verdict`](crate::Verdict).
//! Only building a configuration can be rejected.
use std::time::Duration;
use thiserror::Error;

/// Errors produced when validating limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Window duration must be > 0.
    #[error("window duration must be > 0 (got {0:?})")]
    ZeroWindow(Duration),
    /// An identity extractor must be supplied.
    #[error("an identity extractor is required")]
    MissingExtractor,
}

impl ConfigError {
    /// Check if this error is due to a zero-length window.
    pub fn is_zero_window(&self) -> bool {
        matches!(self, Self::ZeroWindow(_))
    }
}
