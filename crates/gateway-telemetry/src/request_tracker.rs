//! Per-request telemetry the dispatcher emits once a dispatch concludes.

use serde::Serialize;
use std::time::{Duration, Instant};

/// Facts the dispatcher records before a dispatch begins.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// The resolved instance's name.
    pub instance: String,
    /// `"transparent"` or `"protocol"`.
    pub mode: &'static str,
    /// The provider kind's path segment, e.g. `"bedrock"`.
    pub provider: String,
    /// Request-correlation id.
    pub request_id: String,
    /// When the dispatch started.
    started_at: Instant,
}

impl RequestInfo {
    /// Start tracking a dispatch.
    #[must_use]
    pub fn start(instance: impl Into<String>, mode: &'static str, provider: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            mode,
            provider: provider.into(),
            request_id: request_id.into(),
            started_at: Instant::now(),
        }
    }

    /// Elapsed wall time since [`Self::start`].
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// How a tracked dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Completed and returned a response to the caller.
    Success,
    /// Completed with an error taxon surfaced to the caller.
    Error,
    /// Cancelled by caller disconnect or deadline (scenario E).
    Cancelled,
}

/// Logs one structured line per concluded dispatch, correlating every
/// earlier phase's spans via `request_id`.
pub struct RequestTracker;

impl RequestTracker {
    /// Emit the terminal log line for a dispatch.
    pub fn record(info: &RequestInfo, outcome: RequestOutcome, status: Option<u16>) {
        tracing::info!(
            instance = %info.instance,
            mode = info.mode,
            provider = %info.provider,
            request_id = %info.request_id,
            outcome = ?outcome,
            status = status,
            elapsed_ms = info.elapsed().as_millis() as u64,
            "dispatch complete"
        );
    }
}
