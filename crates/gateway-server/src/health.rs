//! `/health` and `/ready`: minimal stand-ins, since the probe
//! sink itself — deep provider connectivity checks, readiness scoring — is
//! out of scope for this gateway. Both return a static
//! 200 with a tiny JSON body; the handlers live in [`crate::routes`].

use serde::Serialize;

/// Body returned by both `/health` and `/ready`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok" }
    }
}
