//! Google Vertex AI's Gemini `generateContent` shape: `contents` instead of
//! `messages`, `role: "model"` instead of `"assistant"`, a nested
//! `generationConfig`, and `finishReason` in SCREAMING_SNAKE_CASE.

use super::DialectTranslator;
use gateway_core::{
    CanonicalRequest, CanonicalResponse, ChatChunk, Choice, ChunkChoice, ChunkDelta, ContentPart,
    Dialect, DocumentSource, FinishReason, GatewayError, MessageContent, MessageRole,
    ResponseMessage, StreamFrame, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Translator for [`Dialect::VertexGemini`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexGeminiTranslator;

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "inlineData")]
    inline_data: Option<GeminiInlineData>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "fileData")]
    file_data: Option<GeminiFileData>,
}

/// A base64-inlined image or document part.
#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

/// An image or document referenced by URL rather than inlined — Gemini's
/// "inline URL reference" form (spec.md §4.6).
#[derive(Debug, Serialize, Deserialize, Clone)]
struct GeminiFileData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    #[serde(rename = "fileUri")]
    file_uri: String,
}

/// Content parts for one message: text passes through; `image_url`/
/// `document` map to `inlineData` when given as a data URI/base64 payload,
/// or to a `fileData` URL reference otherwise (spec.md §4.6 "inline URL
/// reference for Gemini") — Gemini has a native slot for both forms, so
/// nothing here is ever dropped.
fn gemini_parts(content: &MessageContent) -> Vec<GeminiPart> {
    content
        .parts()
        .into_iter()
        .map(|part| match part {
            ContentPart::Text { text } => GeminiPart { text: Some(text), ..GeminiPart::default() },
            ContentPart::ImageUrl { image_url } => match super::parse_data_url(&image_url.url) {
                Some((media_type, data)) => GeminiPart {
                    inline_data: Some(GeminiInlineData {
                        mime_type: media_type.to_string(),
                        data: data.to_string(),
                    }),
                    ..GeminiPart::default()
                },
                None => GeminiPart {
                    file_data: Some(GeminiFileData {
                        mime_type: super::guess_mime_type(&image_url.url, "image/jpeg"),
                        file_uri: image_url.url,
                    }),
                    ..GeminiPart::default()
                },
            },
            ContentPart::Document { source } => match source {
                DocumentSource::Base64 { media_type, data } => GeminiPart {
                    inline_data: Some(GeminiInlineData { mime_type: media_type, data }),
                    ..GeminiPart::default()
                },
                DocumentSource::Url { url } => GeminiPart {
                    file_data: Some(GeminiFileData {
                        mime_type: super::guess_mime_type(&url, "application/pdf"),
                        file_uri: url,
                    }),
                    ..GeminiPart::default()
                },
            },
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}

fn finish_reason_from_gemini(reason: &str) -> FinishReason {
    match reason {
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

impl DialectTranslator for VertexGeminiTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::VertexGemini
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        let contents: Vec<GeminiContent> = request
            .conversation_messages()
            .map(|m| GeminiContent {
                role: match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                },
                parts: gemini_parts(&m.content),
            })
            .collect();

        let mut native = json!({ "contents": contents });

        if let Some(system) = request.system_text() {
            native["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = request.temperature {
            generation_config.insert("temperature".to_string(), json!(t));
        }
        if let Some(p) = request.top_p {
            generation_config.insert("topP".to_string(), json!(p));
        }
        if let Some(m) = request.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(m));
        }
        if let Some(stop) = &request.stop {
            generation_config.insert("stopSequences".to_string(), json!(stop));
        }
        if !generation_config.is_empty() {
            native["generationConfig"] = serde_json::Value::Object(generation_config);
        }

        Ok(native)
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let response: GeminiResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("vertex_gemini", e))?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| super::translation_error("vertex_gemini", "response has no candidates"))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage_metadata
            .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
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
                finish_reason: candidate
                    .finish_reason
                    .as_deref()
                    .map(finish_reason_from_gemini)
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
        let response: GeminiResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("vertex_gemini", e))?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Ok(Vec::new());
        };

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let chunk = ChatChunk {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.to_string(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: if text.is_empty() { None } else { Some(text) },
                    tool_calls: None,
                },
                finish_reason: candidate.finish_reason.as_deref().map(finish_reason_from_gemini),
            }],
            usage: response
                .usage_metadata
                .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count)),
        };

        Ok(super::stream_frames_from_chat_chunk(chunk))
    }
}
