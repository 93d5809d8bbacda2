//! Azure OpenAI: same JSON shape as OpenAI chat-completions, minus the
//! `model` field (the deployment in the URL path selects it instead).

use super::DialectTranslator;
use gateway_core::{
    ChatChunk, Choice, FinishReason, GatewayError, ResponseMessage, CanonicalRequest,
    CanonicalResponse, Dialect, StreamFrame, ToolCall, Usage,
};
use serde::{Deserialize, Serialize};

/// Translator for [`Dialect::AzureOpenai`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureOpenaiTranslator;

#[derive(Debug, Serialize)]
struct AzureChatRequest<'a> {
    messages: &'a [gateway_core::ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [gateway_core::ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a gateway_core::ToolChoice>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct AzureChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<AzureChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    index: u32,
    message: AzureMessage,
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
struct AzureMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl DialectTranslator for AzureOpenaiTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::AzureOpenai
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        let native = AzureChatRequest {
            messages: &request.messages,
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            stop: request.stop.as_deref(),
            seed: request.seed,
            tools: request.tools.as_deref(),
            tool_choice: request.tool_choice.as_ref(),
            stream: request.stream,
        };
        serde_json::to_value(native).map_err(|e| super::translation_error("azure_openai", e))
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let response: AzureChatResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("azure_openai", e))?;

        let choices = response
            .choices
            .into_iter()
            .map(|c| Choice {
                index: c.index,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: c.message.content,
                    tool_calls: c.message.tool_calls,
                },
                finish_reason: c.finish_reason.unwrap_or(FinishReason::Stop),
            })
            .collect();

        Ok(CanonicalResponse {
            id: super::synthesize_response_id(),
            object: "chat.completion".to_string(),
            created: started_at,
            model: response.model.unwrap_or_default(),
            choices,
            usage: response.usage.unwrap_or_default(),
        })
    }

    fn decode_frame(
        &self,
        native: serde_json::Value,
        _id: &str,
        _created: i64,
        _model: &str,
    ) -> Result<Vec<StreamFrame>, GatewayError> {
        let chunk: ChatChunk =
            serde_json::from_value(native).map_err(|e| super::translation_error("azure_openai", e))?;
        Ok(super::stream_frames_from_chat_chunk(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::ChatMessage;
    use serde_json::json;

    fn bare_request() -> CanonicalRequest {
        CanonicalRequest {
            id: gateway_core::RequestId::generate(),
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.2),
            top_p: None,
            max_tokens: Some(100),
            stop: None,
            seed: None,
            tools: None,
            tool_choice: None,
            stream: false,
        }
    }

    #[test]
    fn to_native_omits_model_field() {
        let native = AzureOpenaiTranslator.to_native(&bare_request()).unwrap();
        assert!(native.get("model").is_none());
        assert_eq!(native["temperature"], 0.2);
    }

    #[test]
    fn from_native_defaults_model_when_absent() {
        let native = json!({
            "id": "chatcmpl-abc",
            "choices": [{
                "index": 0,
                "message": {"content": "hi"},
                "finish_reason": "stop",
            }],
        });
        let response = AzureOpenaiTranslator.from_native(native, 1700000000).unwrap();
        assert_eq!(response.model, "");
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn from_native_always_synthesizes_canonical_id() {
        let native = json!({
            "id": "azure-upstream-id-123",
            "choices": [{
                "index": 0,
                "message": {"content": "hi"},
                "finish_reason": "stop",
            }],
        });
        let response = AzureOpenaiTranslator.from_native(native, 1700000000).unwrap();
        assert_ne!(response.id, "azure-upstream-id-123");
        assert!(response.id.starts_with("chatcmpl-"));
    }
}
