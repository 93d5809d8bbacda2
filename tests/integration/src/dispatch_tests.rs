//! HTTP-level dispatch scenarios (spec.md §8 scenarios A, B, F; method
//! gating).

use crate::{
    anthropic_upstream_response, azure_upstream_response, canonical_request_body,
    mount_json_post, multimodal_request_body, openai_upstream_response, protocol_anthropic_yaml,
    protocol_azure_yaml, protocol_openai_identity_yaml, protocol_watsonx_yaml,
    transparent_openai_yaml, watsonx_generation_response, TestServer,
};
use gateway_core::CanonicalResponse;
use wiremock::MockServer;

/// Transparent passthrough preserves the upstream body byte-for-byte,
/// including fields the canonical response shape doesn't know about.
#[tokio::test]
async fn transparent_mode_forwards_upstream_body_verbatim() {
    let upstream = MockServer::start().await;
    let upstream_body = openai_upstream_response("gpt-4o-mini");
    mount_json_post(&upstream, "/v1/chat/completions", 200, &upstream_body).await;

    let server = TestServer::start(&transparent_openai_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/transparent/openai/v1/chat/completions"))
        .json(&canonical_request_body("gpt-4o-mini", false))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("body must be json");
    assert_eq!(body, upstream_body);
}

/// Transparent mode strips the caller's own `Authorization` header in
/// favor of the elected credential's signature, rather than forwarding it.
#[tokio::test]
async fn transparent_mode_does_not_forward_caller_authorization() {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    let upstream = MockServer::start().await;
    // Only matches the *elected* credential's signature (the mounted
    // literal "sk-test"), never the caller-supplied header below.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_upstream_response("gpt-4o-mini")))
        .mount(&upstream)
        .await;

    let server = TestServer::start(&transparent_openai_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/transparent/openai/v1/chat/completions"))
        .header("authorization", "Bearer caller-supplied-key")
        .json(&canonical_request_body("gpt-4o-mini", false))
        .send()
        .await
        .expect("request must complete");

    // A 200 here is only reachable if the mock's exact-match on the
    // elected credential's bearer token succeeded, which it could not if
    // the caller's own header had been forwarded untouched instead of
    // stripped and replaced.
    assert_eq!(response.status(), 200);
}

/// Protocol-mode dispatch translates the canonical request to the
/// instance's native dialect, invokes, and translates the response back,
/// stamping the request's model onto a dialect that doesn't echo one
/// itself (spec.md §8 scenario B; the `model`-stamping fix in
/// `dispatch_protocol_inner`).
#[tokio::test]
async fn protocol_mode_translates_watsonx_round_trip() {
    let upstream = MockServer::start().await;
    mount_json_post(
        &upstream,
        "/ml/v1/text/generation",
        200,
        &watsonx_generation_response("hello from watsonx"),
    )
    .await;

    let server = TestServer::start(&protocol_watsonx_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/openai/watsonx_gen"))
        .json(&canonical_request_body("granite-13b-chat", false))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);
    let body: CanonicalResponse = response.json().await.expect("body must be canonical json");
    assert_eq!(body.model, "granite-13b-chat");
    assert_eq!(body.choices[0].message.content.as_deref(), Some("hello from watsonx"));
    assert_eq!(body.usage.prompt_tokens, 12);
    assert_eq!(body.usage.completion_tokens, 6);
}

/// An unresolvable path returns 404 with the canonical error body, not a
/// framework-default page.
#[tokio::test]
async fn unknown_path_returns_canonical_404() {
    let upstream = MockServer::start().await;
    let server = TestServer::start(&transparent_openai_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .get(server.url("/no/such/instance"))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("body must be json");
    assert_eq!(body["error"]["type"], "not_found");
}

/// A method the instance's binding doesn't permit is rejected before any
/// upstream call is attempted.
#[tokio::test]
async fn disallowed_method_is_rejected_before_dispatch() {
    let upstream = MockServer::start().await;
    // No mock mounted: if the gateway dispatched anyway, wiremock would
    // answer with its own 404, which this test also treats as failure
    // since the expected status is 405.
    let server = TestServer::start(&protocol_watsonx_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .get(server.url("/openai/watsonx_gen"))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 405);
}

/// `/health` and `/ready` are static 200s regardless of instance
/// configuration.
#[tokio::test]
async fn health_and_ready_are_always_ok() {
    let upstream = MockServer::start().await;
    let server = TestServer::start(&transparent_openai_yaml(&upstream.uri())).await;
    let client = reqwest::Client::new();

    for path in ["/health", "/ready"] {
        let response = client.get(server.url(path)).send().await.expect("request must complete");
        assert_eq!(response.status(), 200);
    }
}

/// Every protocol-mode dialect rewrites the canonical response id to a
/// synthesized `chatcmpl-` id, never the upstream's own native id — even
/// the dialects (Azure, Anthropic, the OpenAI identity pair) whose native
/// response already carries an id of its own (spec.md §4.6, `id`'s doc
/// comment on `CanonicalResponse`).
#[tokio::test]
async fn protocol_mode_synthesizes_canonical_id_for_azure() {
    let upstream = MockServer::start().await;
    mount_json_post(
        &upstream,
        "/openai/deployments/gpt-4-prod/chat/completions",
        200,
        &azure_upstream_response("gpt-4"),
    )
    .await;

    let server = TestServer::start(&protocol_azure_yaml(&upstream.uri(), "gpt-4", "gpt-4-prod")).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/openai/azure_gen"))
        .json(&canonical_request_body("gpt-4", false))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);
    let body: CanonicalResponse = response.json().await.expect("body must be canonical json");
    assert_ne!(body.id, "azure-native-id-xyz");
    assert!(body.id.starts_with("chatcmpl-"));
}

#[tokio::test]
async fn protocol_mode_synthesizes_canonical_id_for_anthropic() {
    let upstream = MockServer::start().await;
    mount_json_post(&upstream, "/v1/messages", 200, &anthropic_upstream_response("hi there")).await;

    let server = TestServer::start(&protocol_anthropic_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/openai/anthropic_gen"))
        .json(&canonical_request_body("claude-3-sonnet", false))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);
    let body: CanonicalResponse = response.json().await.expect("body must be canonical json");
    assert_ne!(body.id, "msg_01anthropicnative");
    assert!(body.id.starts_with("chatcmpl-"));
    assert_eq!(body.choices[0].message.content.as_deref(), Some("hi there"));
}

/// The `(openai, openai)` identity pair is the one dialect whose native
/// response shape already *is* the canonical shape — it still rewrites
/// `id`/`created` rather than passing the upstream's through untouched,
/// which is what distinguishes protocol mode from transparent mode here
/// (spec.md §8 testable property: identity round-trip modulo id/created).
#[tokio::test]
async fn protocol_mode_synthesizes_canonical_id_for_openai_identity() {
    let upstream = MockServer::start().await;
    mount_json_post(
        &upstream,
        "/v1/chat/completions",
        200,
        &openai_upstream_response("gpt-4o-mini"),
    )
    .await;

    let server = TestServer::start(&protocol_openai_identity_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/openai/openai_passthrough_protocol"))
        .json(&canonical_request_body("gpt-4o-mini", false))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);
    let body: CanonicalResponse = response.json().await.expect("body must be canonical json");
    assert_ne!(body.id, "chatcmpl-upstream123");
    assert!(body.id.starts_with("chatcmpl-"));
}

/// A data-URI image part survives protocol-mode translation into
/// Anthropic's base64 image-block shape rather than being silently
/// dropped (spec.md §4.6).
#[tokio::test]
async fn protocol_mode_embeds_multimodal_image_through_anthropic_translator() {
    let upstream = MockServer::start().await;
    mount_json_post(&upstream, "/v1/messages", 200, &anthropic_upstream_response("i see a cat")).await;

    let server = TestServer::start(&protocol_anthropic_yaml(&upstream.uri())).await;

    let client = reqwest::Client::new();
    let response = client
        .post(server.url("/openai/anthropic_gen"))
        .json(&multimodal_request_body("claude-3-sonnet"))
        .send()
        .await
        .expect("request must complete");

    assert_eq!(response.status(), 200);

    let received = upstream
        .received_requests()
        .await
        .expect("request recording must be enabled");
    let sent: serde_json::Value =
        serde_json::from_slice(&received[0].body).expect("forwarded body must be json");
    let blocks = sent["messages"][0]["content"].as_array().expect("content must be an array");
    assert_eq!(blocks[0]["type"], "text");
    assert_eq!(blocks[1]["type"], "image");
    assert_eq!(blocks[1]["source"]["media_type"], "image/png");
    assert_eq!(blocks[1]["source"]["data"], "aGVsbG8=");
}

/// `/metrics` serves the Prometheus text-exposition format and reflects a
/// request that was just dispatched.
#[tokio::test]
async fn metrics_reflects_dispatched_requests() {
    let upstream = MockServer::start().await;
    mount_json_post(
        &upstream,
        "/v1/chat/completions",
        200,
        &openai_upstream_response("gpt-4o-mini"),
    )
    .await;
    let server = TestServer::start(&transparent_openai_yaml(&upstream.uri())).await;
    let client = reqwest::Client::new();

    client
        .post(server.url("/transparent/openai/v1/chat/completions"))
        .json(&canonical_request_body("gpt-4o-mini", false))
        .send()
        .await
        .expect("request must complete");

    let metrics_body = client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("metrics request must complete")
        .text()
        .await
        .expect("metrics body must be text");

    assert!(metrics_body.contains("requests_total"));
}
