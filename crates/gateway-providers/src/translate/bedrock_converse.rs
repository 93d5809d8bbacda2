//! AWS Bedrock's Converse API request/response shapes.

use super::DialectTranslator;
use gateway_core::{
    CanonicalRequest, CanonicalResponse, Choice, ContentPart, Dialect, FinishReason, GatewayError,
    MessageRole, ResponseMessage, StreamFrame, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Translator for [`Dialect::BedrockConverse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BedrockConverseTranslator;

#[derive(Debug, Serialize)]
struct ConverseMessage {
    role: &'static str,
    content: Vec<ConverseContentBlock>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
struct ConverseContentBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseResponse {
    output: ConverseOutput,
    stop_reason: String,
    #[serde(default)]
    usage: Option<ConverseUsage>,
}

#[derive(Debug, Deserialize)]
struct ConverseOutput {
    message: ConverseOutputMessage,
}

#[derive(Debug, Deserialize)]
struct ConverseOutputMessage {
    content: Vec<ConverseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseStreamEvent {
    #[serde(default)]
    content_block_delta: Option<ConverseContentBlockDelta>,
    #[serde(default)]
    message_stop: Option<ConverseMessageStop>,
    #[serde(default)]
    metadata: Option<ConverseStreamMetadata>,
}

#[derive(Debug, Deserialize)]
struct ConverseContentBlockDelta {
    delta: ConverseContentBlock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConverseMessageStop {
    stop_reason: String,
}

#[derive(Debug, Deserialize)]
struct ConverseStreamMetadata {
    #[serde(default)]
    usage: Option<ConverseUsage>,
}

fn finish_reason_from_stop_reason(stop_reason: &str) -> FinishReason {
    match stop_reason {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        "content_filtered" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

impl DialectTranslator for BedrockConverseTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::BedrockConverse
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        let messages: Vec<ConverseMessage> = request
            .conversation_messages()
            .map(|m| ConverseMessage {
                role: match m.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                },
                content: m
                    .content
                    .parts()
                    .into_iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => Some(ConverseContentBlock { text: Some(text) }),
                        ContentPart::ImageUrl { .. } => {
                            super::warn_dropped_part(
                                "bedrock_converse",
                                "image_url",
                                "no image mapping defined for this dialect",
                            );
                            None
                        }
                        ContentPart::Document { .. } => {
                            super::warn_dropped_part(
                                "bedrock_converse",
                                "document",
                                "no document mapping defined for this dialect",
                            );
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        let mut native = json!({ "messages": messages });

        if let Some(system) = request.system_text() {
            native["system"] = json!([{ "text": system }]);
        }

        let mut inference_config = serde_json::Map::new();
        if let Some(t) = request.temperature {
            inference_config.insert("temperature".to_string(), json!(t));
        }
        if let Some(p) = request.top_p {
            inference_config.insert("topP".to_string(), json!(p));
        }
        if let Some(m) = request.max_tokens {
            inference_config.insert("maxTokens".to_string(), json!(m));
        }
        if let Some(stop) = &request.stop {
            inference_config.insert("stopSequences".to_string(), json!(stop));
        }
        if !inference_config.is_empty() {
            native["inferenceConfig"] = serde_json::Value::Object(inference_config);
        }

        Ok(native)
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let response: ConverseResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("bedrock_converse", e))?;

        let text: String = response
            .output
            .message
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
        use gateway_core::{ChatChunk, ChunkChoice, ChunkDelta};

        let event: ConverseStreamEvent =
            serde_json::from_value(native).map_err(|e| super::translation_error("bedrock_converse", e))?;

        let mut frames = Vec::new();

        if let Some(delta) = event.content_block_delta {
            frames.extend(super::stream_frames_from_chat_chunk(ChatChunk {
                id: id.to_string(),
                object: "chat.completion.chunk".to_string(),
                created,
                model: model.to_string(),
                choices: vec![ChunkChoice {
                    index: 0,
                    delta: ChunkDelta {
                        role: None,
                        content: delta.delta.text,
                        tool_calls: None,
                    },
                    finish_reason: None,
                }],
                usage: None,
            }));
        }

        if let Some(stop) = event.message_stop {
            let usage = event
                .metadata
                .and_then(|m| m.usage)
                .map(|u| Usage::new(u.input_tokens, u.output_tokens));
            frames.extend(super::stream_frames_from_chat_chunk(ChatChunk {
                id: id.to_string(),
                object: "chat.completion.chunk".to_string(),
                created,
                model: model.to_string(),
                choices: vec![ChunkChoice {
                    index: 0,
                    delta: ChunkDelta::default(),
                    finish_reason: Some(finish_reason_from_stop_reason(&stop.stop_reason)),
                }],
                usage,
            }));
        }

        Ok(frames)
    }
}
