//! Maps [`GatewayError`] onto the HTTP response a protocol-mode caller
//! sees. Transparent mode never constructs one of these for
//! an upstream response — only for failures inside the core itself
//! (resolution, credentials, network) — and forwards upstream bytes
//! verbatim otherwise.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_core::{CanonicalErrorBody, GatewayError};

/// Newtype so this crate can implement [`IntoResponse`] for an error type
/// defined in `gateway-core`.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = CanonicalErrorBody::from(&self.0);
        let mut response = (status, Json(body)).into_response();
        if let Some(retry_after) = self.0.retry_after() {
            if let Ok(value) = retry_after.as_secs().to_string().parse() {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
