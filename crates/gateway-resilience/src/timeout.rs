//! Bounded-duration wrapper around a future, mapping expiry to
//! [`GatewayError::Timeout`].
//!
//! Used for the two deadlines named explicitly: the per-strategy
//! credential-acquisition bound (10s) and the upstream request timeout
//! (120s non-streaming / 60s per-frame idle for streaming). Both are just a
//! `TimeoutConfig` with a different `duration`; the manager doesn't need to
//! know which caller it's serving.

use gateway_core::GatewayError;
use std::future::Future;
use std::time::Duration;

/// A single named deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// How long to wait before giving up.
    pub duration: Duration,
}

impl TimeoutConfig {
    /// Build a config with the given duration.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The 10s per-strategy credential-acquisition bound.
    #[must_use]
    pub fn credential_acquisition() -> Self {
        Self::new(Duration::from_secs(10))
    }

    /// The 120s default non-streaming request timeout.
    #[must_use]
    pub fn non_streaming_request() -> Self {
        Self::new(Duration::from_secs(120))
    }

    /// The 60s per-frame idle limit for streaming responses.
    #[must_use]
    pub fn stream_frame_idle() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

/// Runs `fut` to completion, or fails with [`GatewayError::Timeout`] once
/// [`TimeoutConfig::duration`] elapses.
pub struct TimeoutManager {
    config: TimeoutConfig,
}

impl TimeoutManager {
    /// Build a manager enforcing `config`.
    #[must_use]
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Run `fut`, bounding it by the configured duration.
    ///
    /// # Errors
    /// Returns [`GatewayError::Timeout`] if `fut` does not resolve in time.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.config.duration, fut)
            .await
            .map_err(|_| GatewayError::Timeout(self.config.duration))
    }
}
