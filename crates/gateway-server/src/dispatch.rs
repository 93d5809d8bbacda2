//! The per-request state machine: resolve → mode gate → credentials →
//! transparent-or-protocol invocation → telemetry.

use crate::state::AppState;
use axum::body::Bytes as AxumBytes;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use gateway_core::{CanonicalRequest, CanonicalResponse, GatewayError, Instance, Mode, StreamFrame};
use gateway_providers::outbound::OutboundRequest;
use gateway_telemetry::{Metrics, RequestInfo, RequestOutcome, RequestTracker};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Headers a transparent-mode call strips before signing: the caller's own
/// auth, stripped in favor of the elected credential, and hop-by-hop
/// headers that don't make sense to forward to a different origin.
const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "authorization",
    "x-api-key",
    "api-key",
    "x-auth-token",
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Resolve `path` against the registry and enforce the method binding.
///
/// # Errors
/// Returns [`GatewayError::NotFound`] on no match, or
/// [`GatewayError::MethodNotAllowed`] if the matched instance doesn't
/// permit `method`.
pub fn resolve<'a>(
    state: &'a AppState,
    path: &str,
    method: &Method,
) -> Result<(&'a Instance, &'a str), GatewayError> {
    let (instance, prefix) = state
        .registry
        .lookup_by_path(path)
        .ok_or_else(|| GatewayError::not_found(format!("no instance owns path '{path}'"), "instance_not_found"))?;

    let binding = instance
        .endpoints
        .iter()
        .find(|b| prefix == b.path)
        .expect("lookup_by_path only returns a binding that matched");

    if !binding.allows_method(method.as_str()) {
        return Err(GatewayError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
        });
    }

    mode_gate(instance, expected_family(path))?;

    Ok((instance, prefix))
}

/// The mode an endpoint family implies from its URL shape alone (§6 URL
/// surface): `/transparent/...` implies transparent, everything else
/// reaching the catch-all route implies protocol.
fn expected_family(path: &str) -> Mode {
    if path.starts_with("/transparent/") {
        Mode::Transparent
    } else {
        Mode::Protocol
    }
}

/// Enforce that the endpoint family the caller reached matches the
/// instance's configured mode.
///
/// # Errors
/// Returns [`GatewayError::InvalidMode`] on a mismatch.
pub fn mode_gate(instance: &Instance, expected: Mode) -> Result<(), GatewayError> {
    if instance.mode != expected {
        return Err(GatewayError::InvalidMode {
            message: format!(
                "instance '{}' is configured as {:?} but was reached through a {:?} endpoint",
                instance.name, instance.mode, expected
            ),
        });
    }
    Ok(())
}

/// The outcome of a transparent-mode call: the upstream's status, headers,
/// and body, unmodified.
pub struct PassthroughResponse {
    /// Upstream HTTP status.
    pub status: StatusCode,
    /// Upstream headers, as received.
    pub headers: Vec<(String, String)>,
    /// Upstream body bytes, as received.
    pub body: Bytes,
}

/// Run the transparent path: strip the bound prefix, copy method/body,
/// drop caller-auth and hop-by-hop headers, sign with the instance's
/// elected credential, invoke, and return the upstream response verbatim.
///
/// # Errors
/// Propagates credential-acquisition and provider-client failures.
pub async fn dispatch_transparent(
    state: &AppState,
    instance: &Instance,
    matched_prefix: &str,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: AxumBytes,
) -> Result<PassthroughResponse, GatewayError> {
    let suffix = path.strip_prefix(matched_prefix).unwrap_or("");
    let url = gateway_providers::url::transparent_url(instance, suffix)?;

    let mut request = OutboundRequest {
        method: method.to_string(),
        url,
        headers: std::collections::HashMap::new(),
        body: Bytes::from(body),
    };
    for (name, value) in headers {
        let name = name.as_str();
        if STRIPPED_REQUEST_HEADERS.contains(&name) {
            continue;
        }
        if let Ok(value) = value.to_str() {
            request.set_header(name, value.to_string());
        }
    }

    let credential = state.credential_manager(&instance.name)?.get().await?;
    let region = instance.location.region.as_deref().unwrap_or_default();
    let signer = gateway_providers::signer_for(instance.provider, &credential, region);
    signer.sign(&mut request, &credential, Utc::now())?;

    let (status, headers, body) = state.provider_client.invoke_passthrough(&request).await?;
    Ok(PassthroughResponse {
        status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
        headers,
        body,
    })
}

/// Run the non-streaming protocol path: translate the canonical request to
/// the instance's native dialect, invoke, translate the native response
/// back, and stamp the request's model onto the result (dialects that don't
/// echo a model in their own response body, e.g. Bedrock/Vertex/Oracle-IBM,
/// would otherwise leave it empty).
///
/// # Errors
/// Propagates credential, translation, and provider-client failures.
pub async fn dispatch_protocol(
    state: &AppState,
    instance: &Instance,
    request: &CanonicalRequest,
) -> Result<CanonicalResponse, GatewayError> {
    let started_at = unix_now();
    let tracker_info = RequestInfo::start(instance.name.clone(), "protocol", instance.provider.to_string(), request.id.to_string());

    let result = dispatch_protocol_inner(state, instance, request, started_at).await;

    let outcome = match &result {
        Ok(_) => RequestOutcome::Success,
        Err(_) => RequestOutcome::Error,
    };
    let status = result.as_ref().err().map(GatewayError::http_status);
    RequestTracker::record(&tracker_info, outcome, status);
    match &result {
        Ok(_) => state.metrics.record_request(&instance.name),
        Err(e) => state.metrics.record_error(&instance.name, e.taxon()),
    }

    result
}

async fn dispatch_protocol_inner(
    state: &AppState,
    instance: &Instance,
    request: &CanonicalRequest,
    started_at: i64,
) -> Result<CanonicalResponse, GatewayError> {
    request.validate()?;

    let translation = instance.translation.as_ref().ok_or_else(|| {
        GatewayError::Internal(format!("instance '{}': protocol mode requires a translation pair", instance.name))
    })?;

    let request_translator = gateway_providers::translator_for(translation.request_to);
    let native_request = request_translator.to_native(request)?;

    let url = gateway_providers::url::protocol_invoke_url(instance, &request.model, false)?;
    let mut outbound = OutboundRequest::json_post(url, Bytes::from(serde_json::to_vec(&native_request).map_err(|e| {
        GatewayError::Internal(format!("failed to serialize native request: {e}"))
    })?));
    if instance.provider == gateway_core::ProviderKind::Anthropic {
        outbound.set_header("anthropic-version", "2023-06-01");
    }

    let credential = state.credential_manager(&instance.name)?.get().await?;
    let region = instance.location.region.as_deref().unwrap_or_default();
    let signer = gateway_providers::signer_for(instance.provider, &credential, region);
    signer.sign(&mut outbound, &credential, Utc::now())?;

    let native_response = state.provider_client.invoke(&outbound).await?;

    let response_translator = gateway_providers::translator_for(translation.response_from);
    let mut response = response_translator.from_native(native_response, started_at)?;
    response.model = request.model.clone();
    Ok(response)
}

/// Run the streaming protocol path, yielding canonical stream frames as
/// they arrive.
///
/// # Errors
/// Returns an error if the initial upstream connection or translation
/// setup fails; failures after the first frame surface as a
/// [`StreamFrame::Error`] within the returned stream instead, since the
/// caller's response has already started.
pub async fn dispatch_protocol_stream(
    state: &AppState,
    instance: &Instance,
    request: &CanonicalRequest,
) -> Result<impl Stream<Item = StreamFrame>, GatewayError> {
    request.validate()?;

    let translation = instance.translation.as_ref().ok_or_else(|| {
        GatewayError::Internal(format!("instance '{}': protocol mode requires a translation pair", instance.name))
    })?;

    let request_translator = gateway_providers::translator_for(translation.request_to);
    let mut native_request = request_translator.to_native(request)?;
    if let Some(obj) = native_request.as_object_mut() {
        obj.insert("stream".to_string(), serde_json::Value::Bool(true));
    }

    let url = gateway_providers::url::protocol_invoke_url(instance, &request.model, true)?;
    let mut outbound = OutboundRequest::json_post(url, Bytes::from(serde_json::to_vec(&native_request).map_err(|e| {
        GatewayError::Internal(format!("failed to serialize native request: {e}"))
    })?));
    if instance.provider == gateway_core::ProviderKind::Anthropic {
        outbound.set_header("anthropic-version", "2023-06-01");
    }

    let credential = state.credential_manager(&instance.name)?.get().await?;
    let region = instance.location.region.as_deref().unwrap_or_default();
    let signer = gateway_providers::signer_for(instance.provider, &credential, region);
    signer.sign(&mut outbound, &credential, Utc::now())?;

    let byte_stream = state.provider_client.invoke_stream(&outbound).await?;
    let json_frames = gateway_providers::json_frames(Box::pin(byte_stream));

    let id = gateway_providers::translate::synthesize_response_id();
    let created = unix_now();
    let model = request.model.clone();
    let response_dialect = translation.response_from;

    let frames = json_frames.flat_map(move |frame| {
        let translator = gateway_providers::translator_for(response_dialect);
        let frames = match frame {
            Ok(native) => translator
                .decode_frame(native, &id, created, &model)
                .unwrap_or_else(|e| vec![StreamFrame::Error { message: e.to_string() }]),
            Err(e) => vec![StreamFrame::Error { message: e.to_string() }],
        };
        futures_util::stream::iter(frames)
    });

    let mut guard = Some(CancelGuard::new(
        Arc::clone(&state.metrics),
        instance.name.clone(),
        request.id.to_string(),
    ));
    let tracked = frames.inspect(move |frame| {
        if matches!(frame, StreamFrame::Done { .. } | StreamFrame::Error { .. }) {
            if let Some(g) = guard.take() {
                g.disarm();
            }
        }
    });

    Ok(Box::pin(tracked))
}

/// Detects caller disconnects mid-stream: a dropped response body drops
/// the SSE stream, which drops this guard before it ever sees a
/// `Done`/`Error` frame. `disarm` is called once a frame proves the
/// stream concluded normally.
struct CancelGuard {
    metrics: Arc<Metrics>,
    instance: String,
    request_id: String,
    armed: bool,
}

impl CancelGuard {
    fn new(metrics: Arc<Metrics>, instance: String, request_id: String) -> Self {
        Self {
            metrics,
            instance,
            request_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.armed {
            self.metrics.record_cancelled(&self.instance);
            tracing::info!(instance = %self.instance, request_id = %self.request_id, "dispatch cancelled");
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
