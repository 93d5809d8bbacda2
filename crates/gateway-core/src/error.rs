//! Error taxonomy for the gateway.
//!
//! Every error the dispatcher can surface to a caller maps to exactly one
//! taxon below, each with a fixed HTTP status and machine-readable code.
//! Transparent mode never constructs one of these for an upstream response;
//! it forwards upstream bytes verbatim and only raises `GatewayError` for
//! failures in the core itself (resolution, credentials, network).

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// The taxonomy from the error handling design.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed canonical body, unknown model, unsupported content part.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Human-readable detail.
        message: String,
        /// Machine code, e.g. "empty_messages".
        code: &'static str,
    },

    /// Caller auth failure. Normally intercepted upstream of the core; kept
    /// here so the core can pass it through uniformly when it does occur.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Human-readable detail.
        message: String,
    },

    /// Path does not resolve to any instance, or a named resource is
    /// missing upstream.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable detail.
        message: String,
        /// Machine code, e.g. "instance_not_found".
        code: &'static str,
    },

    /// The matched instance does not allow this HTTP method.
    #[error("method not allowed: {method} on {path}")]
    MethodNotAllowed {
        /// The rejected method.
        method: String,
        /// The request path.
        path: String,
    },

    /// Endpoint family and instance mode mismatch.
    #[error("invalid mode: {message}")]
    InvalidMode {
        /// Human-readable detail.
        message: String,
    },

    /// Canonical-to-native conversion could not be performed.
    #[error("translation failed: {message}")]
    TranslationFailed {
        /// Human-readable detail.
        message: String,
    },

    /// Upstream rejected with a rate limit.
    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimited {
        /// `Retry-After`, if the upstream provided one.
        retry_after: Option<Duration>,
    },

    /// Upstream returned 5xx or closed mid-stream after retries.
    #[error("upstream error: {message}")]
    UpstreamError {
        /// Human-readable detail.
        message: String,
        /// Upstream status code, if one was received.
        status: Option<u16>,
        /// Raw upstream error body, preserved verbatim.
        detail: Option<String>,
    },

    /// Credential manager has no viable strategy for this instance.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Human-readable detail, including the strategy name that failed.
        message: String,
    },

    /// Upstream exceeded the configured deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Unexpected invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Construct an [`GatewayError::InvalidRequest`].
    #[must_use]
    pub fn invalid_request(message: impl Into<String>, code: &'static str) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            code,
        }
    }

    /// Construct a [`GatewayError::NotFound`].
    #[must_use]
    pub fn not_found(message: impl Into<String>, code: &'static str) -> Self {
        Self::NotFound {
            message: message.into(),
            code,
        }
    }

    /// Construct a [`GatewayError::TranslationFailed`].
    #[must_use]
    pub fn translation_failed(message: impl Into<String>) -> Self {
        Self::TranslationFailed {
            message: message.into(),
        }
    }

    /// Construct a [`GatewayError::ServiceUnavailable`] naming the strategy
    /// that failed, per spec (detail must carry the strategy name).
    #[must_use]
    pub fn service_unavailable(strategy: impl std::fmt::Display) -> Self {
        Self::ServiceUnavailable {
            message: format!("no viable credential strategy (last attempted: {strategy})"),
        }
    }

    /// Construct a [`GatewayError::UpstreamError`].
    #[must_use]
    pub fn upstream(
        message: impl Into<String>,
        status: Option<u16>,
        detail: Option<String>,
    ) -> Self {
        Self::UpstreamError {
            message: message.into(),
            status,
            detail,
        }
    }

    /// The taxon name used in the canonical error body and in logs.
    #[must_use]
    pub fn taxon(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::InvalidMode { .. } => "invalid_mode",
            Self::TranslationFailed { .. } => "translation_failed",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamError { .. } => "upstream_error",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// The machine-readable `code` field of the canonical error body.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { code, .. } | Self::NotFound { code, .. } => code,
            Self::Unauthorized { .. } => "unauthorized",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::InvalidMode { .. } => "invalid_mode",
            Self::TranslationFailed { .. } => "translation_failed",
            Self::RateLimited { .. } => "rate_limited",
            Self::UpstreamError { .. } => "upstream_error",
            Self::ServiceUnavailable { .. } => "service_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal_error",
        }
    }

    /// The HTTP status this taxon maps to.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidMode { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::NotFound { .. } => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::TranslationFailed { .. } => 400,
            Self::RateLimited { .. } => 429,
            Self::UpstreamError { .. } => 502,
            Self::ServiceUnavailable { .. } => 503,
            Self::Timeout(_) => 504,
            Self::Internal(_) => 500,
        }
    }

    /// `Retry-After`, when this error carries one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether a retrying provider client should attempt this again.
    ///
    /// Mirrors spec.md §4.7: retry network/5xx (excluding 501) and 429
    /// (bounded separately), never 4xx otherwise.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::UpstreamError { status, .. } => {
                status.is_none_or(|s| s != 501 && (s >= 500 || s == 429))
            }
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

/// The canonical protocol-mode error body: `{"error": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalErrorBody {
    /// The single `error` object.
    pub error: CanonicalErrorObject,
}

/// The inner object of [`CanonicalErrorBody`].
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalErrorObject {
    /// Human-readable message.
    pub message: String,
    /// Taxon, e.g. "not_found".
    #[serde(rename = "type")]
    pub error_type: String,
    /// Short machine-readable identifier, e.g. "instance_not_found".
    pub code: String,
}

impl From<&GatewayError> for CanonicalErrorBody {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: CanonicalErrorObject {
                message: err.to_string(),
                error_type: err.taxon().to_string(),
                code: err.code().to_string(),
            },
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxon_status_mapping_matches_spec() {
        assert_eq!(GatewayError::invalid_request("x", "y").http_status(), 400);
        assert_eq!(
            GatewayError::not_found("x", "instance_not_found").http_status(),
            404
        );
        assert_eq!(
            GatewayError::RateLimited { retry_after: None }.http_status(),
            429
        );
        assert_eq!(GatewayError::Timeout(Duration::from_secs(1)).http_status(), 504);
        assert_eq!(
            GatewayError::service_unavailable("vault").http_status(),
            503
        );
    }

    #[test]
    fn retryability_excludes_501_and_plain_4xx() {
        let not_implemented = GatewayError::upstream("x", Some(501), None);
        assert!(!not_implemented.is_retryable());

        let bad_request = GatewayError::upstream("x", Some(400), None);
        assert!(!bad_request.is_retryable());

        let bad_gateway = GatewayError::upstream("x", Some(502), None);
        assert!(bad_gateway.is_retryable());

        let rate_limited = GatewayError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert!(rate_limited.is_retryable());
    }

    #[test]
    fn canonical_body_roundtrips_fields() {
        let err = GatewayError::not_found("nope", "instance_not_found");
        let body = CanonicalErrorBody::from(&err);
        assert_eq!(body.error.error_type, "not_found");
        assert_eq!(body.error.code, "instance_not_found");
    }
}
