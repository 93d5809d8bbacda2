//! Anthropic's Messages API: system prompt out-of-band, `max_tokens`
//! required, and a `stop_reason` vocabulary distinct from OpenAI's.

use super::DialectTranslator;
use gateway_core::{
    CanonicalRequest, CanonicalResponse, ChatChunk, Choice, ChunkChoice, ChunkDelta, ContentPart,
    Dialect, DocumentSource, FinishReason, GatewayError, MessageContent, MessageRole,
    ResponseMessage, StreamFrame, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Translator for [`Dialect::AnthropicMessages`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicMessagesTranslator;

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<serde_json::Value>,
}

/// Content blocks for one message: text passes through, `image_url` embeds
/// as base64 when it's already a data URI (dropped otherwise — this crate
/// doesn't fetch remote images), and `document` maps to Anthropic's own
/// base64/url source variants one-to-one (spec.md §4.6).
fn anthropic_content_blocks(content: &MessageContent) -> Vec<serde_json::Value> {
    content
        .parts()
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(json!({"type": "text", "text": text})),
            ContentPart::ImageUrl { image_url } => match super::parse_data_url(&image_url.url) {
                Some((media_type, data)) => Some(json!({
                    "type": "image",
                    "source": {"type": "base64", "media_type": media_type, "data": data},
                })),
                None => {
                    super::warn_dropped_part(
                        "anthropic_messages",
                        "image_url",
                        "not a data: URI; no base64 embed possible without fetching",
                    );
                    None
                }
            },
            ContentPart::Document { source } => Some(match source {
                DocumentSource::Base64 { media_type, data } => json!({
                    "type": "document",
                    "source": {"type": "base64", "media_type": media_type, "data": data},
                }),
                DocumentSource::Url { url } => json!({
                    "type": "document",
                    "source": {"type": "url", "url": url},
                }),
            }),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: String,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamEvent {
    ContentBlockDelta {
        delta: AnthropicStreamDelta,
    },
    MessageDelta {
        delta: AnthropicMessageDelta,
        #[serde(default)]
        usage: Option<AnthropicUsage>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicStreamDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

fn finish_reason_from_stop_reason(stop_reason: &str) -> FinishReason {
    match stop_reason {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

impl DialectTranslator for AnthropicMessagesTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::AnthropicMessages
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        let messages: Vec<AnthropicMessage> = request
            .conversation_messages()
            .map(|m| AnthropicMessage {
                role: match m.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                },
                content: anthropic_content_blocks(&m.content),
            })
            .collect();

        // Anthropic requires `max_tokens`; fall back to a conservative
        // default when the canonical request didn't set one.
        let max_tokens = request.max_tokens.unwrap_or(4096);

        let mut native = json!({
            "model": request.model,
            "messages": messages,
            "max_tokens": max_tokens,
            "stream": request.stream,
        });

        if let Some(system) = request.system_text() {
            native["system"] = json!(system);
        }
        if let Some(t) = request.temperature {
            native["temperature"] = json!(t);
        }
        if let Some(p) = request.top_p {
            native["top_p"] = json!(p);
        }
        if let Some(stop) = &request.stop {
            native["stop_sequences"] = json!(stop);
        }

        Ok(native)
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let response: AnthropicResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("anthropic_messages", e))?;

        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(CanonicalResponse {
            id: super::synthesize_response_id(),
            object: "chat.completion".to_string(),
            created: started_at,
            model: String::new(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: Some(text),
                    tool_calls: None,
                },
                finish_reason: finish_reason_from_stop_reason(&response.stop_reason),
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
        let event: AnthropicStreamEvent =
            serde_json::from_value(native).map_err(|e| super::translation_error("anthropic_messages", e))?;

        let chunk = match event {
            AnthropicStreamEvent::ContentBlockDelta { delta } => ChatChunk {
                id: id.to_string(),
                object: "chat.completion.chunk".to_string(),
                created,
                model: model.to_string(),
                choices: vec![ChunkChoice {
                    index: 0,
                    delta: ChunkDelta {
                        role: None,
                        content: delta.text,
                        tool_calls: None,
                    },
                    finish_reason: None,
                }],
                usage: None,
            },
            AnthropicStreamEvent::MessageDelta { delta, usage } => ChatChunk {
                id: id.to_string(),
                object: "chat.completion.chunk".to_string(),
                created,
                model: model.to_string(),
                choices: vec![ChunkChoice {
                    index: 0,
                    delta: ChunkDelta::default(),
                    finish_reason: delta
                        .stop_reason
                        .as_deref()
                        .map(finish_reason_from_stop_reason),
                }],
                usage: usage.map(|u| Usage::new(u.input_tokens, u.output_tokens)),
            },
            AnthropicStreamEvent::Other => return Ok(Vec::new()),
        };

        Ok(super::stream_frames_from_chat_chunk(chunk))
    }
}
