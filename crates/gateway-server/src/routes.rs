//! Builds the axum `Router`: one dynamic route per mode family, plus the
//! legacy `/v1/chat/completions` family and the minimal `/health`, `/ready`,
//! `/metrics` stand-ins.

use crate::dispatch;
use crate::error::ApiError;
use crate::health::HealthResponse;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use gateway_core::{
    CanonicalErrorBody, CanonicalRequest, ChatChunk, ChunkChoice, ChunkDelta, GatewayError, Mode, ModelObject,
    ModelsResponse, ProviderKind, StreamFrame,
};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Build the full application router over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/chat/completions", post(legacy_chat_completions))
        .route("/v1/models", get(legacy_list_models))
        .route("/v1/models/:id", get(legacy_get_model))
        .fallback(dynamic_dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => ([("content-type", "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => ApiError(GatewayError::Internal(format!("metrics encoding failed: {e}"))).into_response(),
    }
}

/// Catch-all route: resolves `path` against the registry,
/// enforces the mode gate, and dispatches transparently or through
/// translation.
async fn dynamic_dispatch(State(state): State<AppState>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (instance, prefix) = match dispatch::resolve(&state, &path, &method) {
        Ok(found) => found,
        Err(e) => return ApiError(e).into_response(),
    };
    let instance_name = instance.name.clone();

    match instance.mode {
        Mode::Transparent => {
            let headers = request.headers().clone();
            let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
                Ok(b) => b,
                Err(e) => return ApiError(GatewayError::invalid_request(format!("failed to read body: {e}"), "invalid_body")).into_response(),
            };

            let span = tracing::info_span!("dispatch_transparent", instance = %instance_name);
            let result = dispatch::dispatch_transparent(&state, instance, prefix, &method, &path, &headers, body)
                .instrument(span)
                .await;

            match result {
                Ok(passthrough) => {
                    let mut response = Response::builder().status(passthrough.status);
                    for (name, value) in &passthrough.headers {
                        response = response.header(name, value);
                    }
                    response
                        .body(Body::from(passthrough.body))
                        .unwrap_or_else(|_| ApiError(GatewayError::Internal("failed to build passthrough response".into())).into_response())
                }
                Err(e) => ApiError(e).into_response(),
            }
        }
        Mode::Protocol => {
            let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
                Ok(b) => b,
                Err(e) => return ApiError(GatewayError::invalid_request(format!("failed to read body: {e}"), "invalid_body")).into_response(),
            };
            let canonical: CanonicalRequest = match serde_json::from_slice(&body) {
                Ok(r) => r,
                Err(e) => return ApiError(GatewayError::invalid_request(format!("malformed request body: {e}"), "malformed_json")).into_response(),
            };

            protocol_dispatch(&state, instance, &instance_name, canonical).await
        }
    }
}

async fn protocol_dispatch(
    state: &AppState,
    instance: &gateway_core::Instance,
    instance_name: &str,
    request: CanonicalRequest,
) -> Response {
    if request.stream {
        let model = request.model.clone();
        let span = tracing::info_span!("dispatch_protocol_stream", instance = %instance_name);
        match dispatch::dispatch_protocol_stream(state, instance, &request).instrument(span).await {
            Ok(frames) => stream_response(frames, model),
            Err(e) => ApiError(e).into_response(),
        }
    } else {
        let span = tracing::info_span!("dispatch_protocol", instance = %instance_name);
        match dispatch::dispatch_protocol(state, instance, &request).instrument(span).await {
            Ok(response) => Json(response).into_response(),
            Err(e) => ApiError(e).into_response(),
        }
    }
}

/// `StreamFrame` carries no wire identity of its own: every
/// frame of one response shares the same `id`/`created`/`model`, assigned
/// here once per stream rather than per chunk.
fn stream_response(frames: impl futures_util::Stream<Item = StreamFrame> + Send + 'static, model: String) -> Response {
    let id = gateway_providers::translate::synthesize_response_id();
    let created = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    let events = frames.map(move |frame| {
        let event = match frame {
            StreamFrame::Done { usage } => {
                let chunk = ChatChunk {
                    id: id.clone(),
                    object: "chat.completion.chunk".to_string(),
                    created,
                    model: model.clone(),
                    choices: vec![ChunkChoice {
                        index: 0,
                        delta: ChunkDelta::default(),
                        finish_reason: None,
                    }],
                    usage,
                };
                Event::default()
                    .json_data(&chunk)
                    .unwrap_or_else(|_| Event::default().data("{}"))
            }
            StreamFrame::Event(event) => {
                let chunk = ChatChunk {
                    id: id.clone(),
                    object: "chat.completion.chunk".to_string(),
                    created,
                    model: model.clone(),
                    choices: vec![ChunkChoice {
                        index: event.choice_index,
                        delta: ChunkDelta {
                            role: event.role,
                            content: event.content_delta,
                            tool_calls: event.tool_call_delta.map(|call| vec![call]),
                        },
                        finish_reason: event.finish_reason,
                    }],
                    usage: None,
                };
                Event::default()
                    .json_data(&chunk)
                    .unwrap_or_else(|_| Event::default().data("{}"))
            }
            StreamFrame::Error { message } => {
                let body = CanonicalErrorBody::from(&GatewayError::upstream(message, None, None));
                Event::default()
                    .json_data(&body)
                    .unwrap_or_else(|_| Event::default().data("{}"))
            }
        };
        Ok::<_, std::convert::Infallible>(event)
    });
    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

/// `POST /v1/chat/completions`: resolves the
/// target instance from `model` via the configured routing defaults rather
/// than a path prefix.
async fn legacy_chat_completions(State(state): State<AppState>, Json(request): Json<CanonicalRequest>) -> Response {
    let Some(instance) = resolve_legacy_instance(&state, &request.model) else {
        return ApiError(GatewayError::not_found(
            format!("no default instance configured for model '{}'", request.model),
            "model_not_routable",
        ))
        .into_response();
    };
    let instance_name = instance.name.clone();

    if instance.mode != Mode::Protocol {
        return ApiError(GatewayError::InvalidMode {
            message: format!("legacy routes require a protocol-mode instance; '{instance_name}' is transparent"),
        })
        .into_response();
    }

    protocol_dispatch(&state, instance, &instance_name, request).await
}

/// Picks the instance the legacy routes hand a bare model name to: first,
/// any configured routing default for a provider kind whose name appears as
/// a prefix of `model`; otherwise the first protocol-mode default declared.
/// The model name selects the instance via the configured routing
/// defaults; the exact prefix-matching heuristic below is this gateway's
/// own choice beyond that — see DESIGN.md.
fn resolve_legacy_instance<'a>(state: &'a AppState, model: &str) -> Option<&'a gateway_core::Instance> {
    const PREFIX_HINTS: &[(&str, ProviderKind)] = &[
        ("claude", ProviderKind::Anthropic),
        ("gemini", ProviderKind::Vertex),
        ("granite", ProviderKind::Ibm),
        ("gpt-", ProviderKind::Openai),
        ("text-", ProviderKind::Openai),
        ("command", ProviderKind::Oracle),
    ];

    for (prefix, provider) in PREFIX_HINTS {
        if model.starts_with(prefix) {
            if let Some(instance) = state.registry.default_for_provider(*provider) {
                return Some(instance);
            }
        }
    }

    [
        ProviderKind::Openai,
        ProviderKind::Anthropic,
        ProviderKind::Bedrock,
        ProviderKind::Azure,
        ProviderKind::Vertex,
        ProviderKind::Ibm,
        ProviderKind::Oracle,
    ]
    .into_iter()
    .find_map(|provider| state.registry.default_for_provider(provider))
}

/// `GET /v1/models`: enumerates every
/// configured instance as a model entry, rather than querying upstreams.
async fn legacy_list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let data = state
        .registry
        .iter()
        .map(|instance| ModelObject {
            id: instance.name.clone(),
            object: "model".to_string(),
            owned_by: instance.provider.to_string(),
        })
        .collect();
    Json(ModelsResponse {
        object: "list".to_string(),
        data,
    })
}

async fn legacy_get_model(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.registry.lookup_by_name(&id) {
        Some(instance) => Json(ModelObject {
            id: instance.name.clone(),
            object: "model".to_string(),
            owned_by: instance.provider.to_string(),
        })
        .into_response(),
        None => ApiError(GatewayError::not_found(format!("no model named '{id}'"), "model_not_found")).into_response(),
    }
}
