//! The shared "generation" shape IBM watsonx and Oracle Generative AI both
//! expose: a flattened `input` prompt rather than a message list, and
//! `results[0].generated_text` / `results[0].stop_reason` in the response.
//!
//! Conversation history is flattened to a single prompt string with
//! role-prefixed turns, since neither API accepts a structured message
//! list the way OpenAI/Anthropic/Gemini do.

use super::DialectTranslator;
use gateway_core::{
    CanonicalRequest, CanonicalResponse, ChatChunk, ChatMessage, Choice, ChunkChoice, ChunkDelta,
    ContentPart, Dialect, FinishReason, GatewayError, MessageContent, MessageRole, ResponseMessage,
    StreamFrame, Usage,
};
use serde::Deserialize;
use serde_json::json;

/// Translator for [`Dialect::OracleIbmGeneration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleIbmGenerationTranslator;

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    input_token_count: Option<u32>,
    #[serde(default)]
    generated_token_count: Option<u32>,
}

fn finish_reason_from_stop_reason(stop_reason: &str) -> FinishReason {
    match stop_reason {
        "max_tokens" | "MAX_TOKENS" => FinishReason::Length,
        "error" => FinishReason::Error,
        _ => FinishReason::Stop,
    }
}

fn flatten_prompt(request: &CanonicalRequest) -> String {
    let mut prompt = String::new();
    if let Some(system) = request.system_text() {
        prompt.push_str(&system);
        prompt.push_str("\n\n");
    }
    for message in request.conversation_messages() {
        let prefix = match message.role {
            MessageRole::Assistant => "Assistant",
            MessageRole::Tool => "Tool",
            _ => "User",
        };
        let text = message_text(message);
        if !text.is_empty() {
            prompt.push_str(prefix);
            prompt.push_str(": ");
            prompt.push_str(&text);
            prompt.push('\n');
        }
    }
    prompt.push_str("Assistant:");
    prompt
}

/// Text content of one message. For a multimodal message this is the text
/// parts alone, joined in order — the non-text parts are dropped (this
/// dialect has no structured-content slot to put them in) but each drop is
/// logged rather than silently skipping the whole message (spec.md §4.6).
fn message_text(message: &ChatMessage) -> String {
    match &message.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.clone()),
                ContentPart::ImageUrl { .. } => {
                    super::warn_dropped_part(
                        "oracle_ibm_generation",
                        "image_url",
                        "prompt is flattened to plain text; no image mapping for this dialect",
                    );
                    None
                }
                ContentPart::Document { .. } => {
                    super::warn_dropped_part(
                        "oracle_ibm_generation",
                        "document",
                        "prompt is flattened to plain text; no document mapping for this dialect",
                    );
                    None
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

impl DialectTranslator for OracleIbmGenerationTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::OracleIbmGeneration
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        let mut parameters = serde_json::Map::new();
        if let Some(t) = request.temperature {
            parameters.insert("temperature".to_string(), json!(t));
        }
        if let Some(p) = request.top_p {
            parameters.insert("top_p".to_string(), json!(p));
        }
        if let Some(m) = request.max_tokens {
            parameters.insert("max_new_tokens".to_string(), json!(m));
        }
        if let Some(stop) = &request.stop {
            parameters.insert("stop_sequences".to_string(), json!(stop));
        }

        let mut native = json!({
            "model_id": request.model,
            "input": flatten_prompt(request),
        });
        if !parameters.is_empty() {
            native["parameters"] = serde_json::Value::Object(parameters);
        }

        Ok(native)
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let response: GenerationResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("oracle_ibm_generation", e))?;

        let result = response.results.into_iter().next().ok_or_else(|| {
            super::translation_error("oracle_ibm_generation", "response has no results")
        })?;

        let usage = Usage::new(
            result.input_token_count.unwrap_or(0),
            result.generated_token_count.unwrap_or(0),
        );

        Ok(CanonicalResponse {
            id: super::synthesize_response_id(),
            object: "chat.completion".to_string(),
            created: started_at,
            model: String::new(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: Some(result.generated_text),
                    tool_calls: None,
                },
                finish_reason: result
                    .stop_reason
                    .as_deref()
                    .map(finish_reason_from_stop_reason)
                    .unwrap_or(FinishReason::Stop),
            }],
            usage,
        })
    }

    fn decode_frame(
        &self,
        native: serde_json::Value,
        id: &str,
        created: i64,
        model: &str,
    ) -> Result<Vec<StreamFrame>, GatewayError> {
        let response: GenerationResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("oracle_ibm_generation", e))?;

        let Some(result) = response.results.into_iter().next() else {
            return Ok(Vec::new());
        };

        let chunk = ChatChunk {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(result.generated_text),
                    tool_calls: None,
                },
                finish_reason: result.stop_reason.as_deref().map(finish_reason_from_stop_reason),
            }],
            usage: if result.input_token_count.is_some() || result.generated_token_count.is_some() {
                Some(Usage::new(
                    result.input_token_count.unwrap_or(0),
                    result.generated_token_count.unwrap_or(0),
                ))
            } else {
                None
            },
        };

        Ok(super::stream_frames_from_chat_chunk(chunk))
    }
}
