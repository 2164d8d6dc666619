//! Limiter configuration.
//!
//! Configuration is fixed at construction and shared read-only by every
//! decision. Use [`LimiterConfig::builder`] or [`LimiterConfig::new`]; both
//! validate before handing out a config.

use crate::error::ConfigError;
use crate::extract::Extractor;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Validated configuration for a [`FixedWindowLimiter`](crate::FixedWindowLimiter).
pub struct LimiterConfig<Req> {
    window: Duration,
    max_requests: u8,
    extractor: Extractor<Req>,
}

impl<Req> Clone for LimiterConfig<Req> {
    fn clone(&self) -> Self {
        Self {
            window: self.window,
            max_requests: self.max_requests,
            extractor: self.extractor.clone(),
        }
    }
}

impl<Req> fmt::Debug for LimiterConfig<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimiterConfig")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .finish_non_exhaustive()
    }
}

impl<Req> LimiterConfig<Req> {
    /// Create a config with validation.
    ///
    /// A zero `window` is refused with [`ConfigError::ZeroWindow`] rather than
    /// treated as a window that resets on every request.
    ///
    /// # Examples
    /// ```
    /// use windowgate::LimiterConfig;
    /// use std::time::Duration;
    ///
    /// let config = LimiterConfig::new(Duration::from_secs(60), 3, |req: &String| req.clone())
    ///     .unwrap();
    /// assert_eq!(config.max_requests(), 3);
    /// ```
    pub fn new<F>(window: Duration, max_requests: u8, extractor: F) -> Result<Self, ConfigError>
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self::from_parts(window, max_requests, Arc::new(extractor))
    }

    /// Start building a config.
    pub fn builder() -> LimiterConfigBuilder<Req> {
        LimiterConfigBuilder::new()
    }

    fn from_parts(
        window: Duration,
        max_requests: u8,
        extractor: Extractor<Req>,
    ) -> Result<Self, ConfigError> {
        if window == Duration::ZERO {
            return Err(ConfigError::ZeroWindow(window));
        }
        Ok(Self { window, max_requests, extractor })
    }

    /// Length of one fixed window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Requests admitted per identity per window.
    pub fn max_requests(&self) -> u8 {
        self.max_requests
    }

    /// Derive the identity for a request.
    pub fn identify(&self, req: &Req) -> String {
        (self.extractor)(req)
    }
}

/// Builder for [`LimiterConfig`].
pub struct LimiterConfigBuilder<Req> {
    window: Duration,
    max_requests: u8,
    extractor: Option<Extractor<Req>>,
}

impl<Req> Default for LimiterConfigBuilder<Req> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req> LimiterConfigBuilder<Req> {
    /// Defaults: one-minute window, 60 requests, no extractor.
    pub fn new() -> Self {
        Self { window: Duration::from_secs(60), max_requests: 60, extractor: None }
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn max_requests(mut self, max_requests: u8) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extractor));
        self
    }

    /// Use an already shared extractor, e.g. one from [`crate::extract`].
    pub fn shared_extractor(mut self, extractor: Extractor<Req>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Validate and build. Fails on a zero window or a missing extractor.
    pub fn build(self) -> Result<LimiterConfig<Req>, ConfigError> {
        let extractor = self.extractor.ok_or(ConfigError::MissingExtractor)?;
        LimiterConfig::from_parts(self.window, self.max_requests, extractor)
    }
}

/// Serializable window settings, for loading limits from configuration files.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LimitSettings {
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Requests admitted per identity per window.
    pub max_requests: u8,
}

#[cfg(feature = "serde")]
impl LimitSettings {
    /// Combine with an extractor into a validated config.
    pub fn into_config<Req>(self, extractor: Extractor<Req>) -> Result<LimiterConfig<Req>, ConfigError> {
        LimiterConfig::builder()
            .window(Duration::from_millis(self.window_ms))
            .max_requests(self.max_requests)
            .shared_extractor(extractor)
            .build()
    }
}
