//! Configuration-document fragments for the dispatch tests. Each helper
//! returns a full `RawConfig`-shaped YAML document with one instance,
//! pointed at a caller-supplied upstream base URL (a wiremock server in
//! every test) rather than a real provider endpoint.

/// A transparent OpenAI-compatible instance: bearer
/// strategy from a literal key, endpoint overridden to the mock server.
pub fn transparent_openai_yaml(upstream: &str) -> String {
    format!(
        r#"
instances:
  transparent_openai:
    type: openai
    mode: transparent
    endpoint: "{upstream}"
    authentication:
      strategies:
        - type: mounted_secret
          name: static-key
          value: sk-test
    endpoints:
      - path: /transparent/openai
        methods: [GET, POST]
"#
    )
}

/// A protocol-mode watsonx-dialect instance,
/// endpoint overridden to the mock server. Uses the IBM provider kind
/// rather than Bedrock because IBM's signer is a plain bearer token
///, which a `mounted_secret` strategy can satisfy without
/// standing up a real AWS SigV4-capable credential source.
pub fn protocol_watsonx_yaml(upstream: &str) -> String {
    format!(
        r#"
instances:
  watsonx_gen:
    type: ibm
    mode: protocol
    protocol: openai
    transformation:
      request_to: oracle_ibm_generation
      response_from: oracle_ibm_generation
    endpoint: "{upstream}"
    project_id: test-project
    authentication:
      strategies:
        - type: mounted_secret
          name: static-key
          value: sk-watsonx
    endpoints:
      - path: /openai/watsonx_gen
        methods: [POST]
routing:
  ibm: watsonx_gen
"#
    )
}

/// A protocol-mode instance using the identity (OpenAI-to-OpenAI)
/// translation pair, exercising the round-trip property (spec.md §8
/// property #6) without a real upstream dialect conversion.
pub fn protocol_openai_identity_yaml(upstream: &str) -> String {
    format!(
        r#"
instances:
  openai_passthrough_protocol:
    type: openai
    mode: protocol
    protocol: openai
    transformation:
      request_to: openai
      response_from: openai
    endpoint: "{upstream}"
    authentication:
      strategies:
        - type: mounted_secret
          name: static-key
          value: sk-test
    endpoints:
      - path: /openai/openai_passthrough_protocol
        methods: [POST]
"#
    )
}

/// Two transparent instances sharing a provider kind with disambiguating
/// path segments,
/// used to exercise longest-prefix resolution.
pub fn two_transparent_openai_orgs_yaml(upstream_a: &str, upstream_b: &str) -> String {
    format!(
        r#"
instances:
  org1:
    type: openai
    mode: transparent
    endpoint: "{upstream_a}"
    authentication:
      strategies:
        - type: mounted_secret
          name: k1
          value: sk-org1
    endpoints:
      - path: /transparent/openai/org1
        methods: [POST]
  org2:
    type: openai
    mode: transparent
    endpoint: "{upstream_b}"
    authentication:
      strategies:
        - type: mounted_secret
          name: k2
          value: sk-org2
    endpoints:
      - path: /transparent/openai/org2
        methods: [POST]
"#
    )
}

/// A minimal canonical chat-completions request body.
pub fn canonical_request_body(model: &str, stream: bool) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": "hello"}],
        "max_tokens": 20,
        "stream": stream,
    })
}

/// A canonical request body with one user message carrying a data-URI
/// image part alongside text, for exercising multimodal translation.
pub fn multimodal_request_body(model: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [{
            "role": "user",
            "content": [
                {"type": "text", "text": "what's in this image?"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,aGVsbG8="}},
            ],
        }],
        "max_tokens": 20,
        "stream": false,
    })
}

/// A protocol-mode Azure OpenAI instance, endpoint overridden to the mock
/// server. `model` must match the key in its `deployments` map since Azure
/// substitutes a deployment name for the model in its URL path.
pub fn protocol_azure_yaml(upstream: &str, model: &str, deployment: &str) -> String {
    format!(
        r#"
instances:
  azure_gen:
    type: azure
    mode: protocol
    protocol: openai
    transformation:
      request_to: azure_openai
      response_from: azure_openai
    endpoint: "{upstream}"
    deployments:
      {model}: {deployment}
    authentication:
      strategies:
        - type: mounted_secret
          name: static-key
          value: sk-azure
    endpoints:
      - path: /openai/azure_gen
        methods: [POST]
"#
    )
}

/// A protocol-mode Anthropic Messages instance, endpoint overridden to the
/// mock server.
pub fn protocol_anthropic_yaml(upstream: &str) -> String {
    format!(
        r#"
instances:
  anthropic_gen:
    type: anthropic
    mode: protocol
    protocol: openai
    transformation:
      request_to: anthropic_messages
      response_from: anthropic_messages
    endpoint: "{upstream}"
    authentication:
      strategies:
        - type: mounted_secret
          name: static-key
          value: sk-anthropic
    endpoints:
      - path: /openai/anthropic_gen
        methods: [POST]
"#
    )
}

/// A plausible upstream OpenAI chat-completions response, including the
/// upstream-specific fields that transparent mode must preserve verbatim.
pub fn openai_upstream_response(model: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-upstream123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "hi there"},
            "finish_reason": "stop",
            "logprobs": null,
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8},
        "refusal": null,
        "service_tier": "default",
        "system_fingerprint": "fp_test123",
    })
}

/// A plausible upstream Azure OpenAI response body — same shape as
/// OpenAI's but with its own native `id`, which `from_native` must never
/// pass through as the canonical response id.
pub fn azure_upstream_response(model: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "azure-native-id-xyz",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "hi from azure"},
            "finish_reason": "stop",
        }],
        "usage": {"prompt_tokens": 4, "completion_tokens": 3, "total_tokens": 7},
    })
}

/// A plausible upstream Anthropic Messages response body, including its
/// own native `msg_...` id.
pub fn anthropic_upstream_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "msg_01anthropicnative",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 9, "output_tokens": 4},
    })
}

/// A plausible upstream watsonx/Oracle "generation" response body.
pub fn watsonx_generation_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "results": [{
            "generated_text": text,
            "stop_reason": "eos_token",
            "input_token_count": 12,
            "generated_token_count": 6,
        }],
    })
}
