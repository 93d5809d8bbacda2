//! Per-dialect protocol translation: canonical OpenAI shape
//! on the caller-facing side, one native wire shape per provider dialect on
//! the upstream side.

pub mod anthropic_messages;
pub mod azure_openai;
pub mod bedrock_converse;
pub mod openai_identity;
pub mod oracle_ibm_generation;
pub mod vertex_gemini;

use gateway_core::{
    CanonicalRequest, CanonicalResponse, ChatChunk, Dialect, GatewayError, StreamEvent, StreamFrame,
};

/// Bidirectional translation between the canonical shape and one upstream
/// dialect, plus streaming frame decoding for that same dialect.
pub trait DialectTranslator: Send + Sync {
    /// Which dialect this translates.
    fn dialect(&self) -> Dialect;

    /// Canonical request to native request body.
    ///
    /// # Errors
    /// Returns [`GatewayError::TranslationFailed`] if the canonical request
    /// uses a shape this dialect cannot express.
    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError>;

    /// Native (non-streaming) response body to canonical response.
    /// `started_at` is the dispatcher's request-start epoch-seconds
    /// timestamp, used for the canonical `created` field.
    ///
    /// # Errors
    /// Returns [`GatewayError::TranslationFailed`] if the native body
    /// doesn't match this dialect's expected shape.
    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError>;

    /// One native streaming frame, already parsed as JSON, to zero or more
    /// canonical stream frames (a single upstream frame may carry more than
    /// one delta, or none).
    ///
    /// # Errors
    /// Returns [`GatewayError::TranslationFailed`] if the frame doesn't
    /// match this dialect's expected shape.
    fn decode_frame(
        &self,
        native: serde_json::Value,
        id: &str,
        created: i64,
        model: &str,
    ) -> Result<Vec<StreamFrame>, GatewayError>;
}

/// Build the translator for a dialect.
#[must_use]
pub fn translator_for(dialect: Dialect) -> Box<dyn DialectTranslator> {
    match dialect {
        Dialect::Openai => Box::new(openai_identity::OpenaiIdentityTranslator),
        Dialect::AzureOpenai => Box::new(azure_openai::AzureOpenaiTranslator),
        Dialect::BedrockConverse => Box::new(bedrock_converse::BedrockConverseTranslator),
        Dialect::AnthropicMessages => Box::new(anthropic_messages::AnthropicMessagesTranslator),
        Dialect::VertexGemini => Box::new(vertex_gemini::VertexGeminiTranslator),
        Dialect::OracleIbmGeneration => {
            Box::new(oracle_ibm_generation::OracleIbmGenerationTranslator)
        }
    }
}

/// Synthesize a `chatcmpl-<8 hex chars>` response id,
/// protocol-mode only — transparent mode always preserves the upstream id.
#[must_use]
pub fn synthesize_response_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("chatcmpl-{}", &uuid[..8])
}

fn translation_error(dialect: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::translation_failed(format!("{dialect}: {detail}"))
}

/// Logs a content part a dialect can't express, per spec.md §4.6 ("or is
/// dropped with a translation warning if unsupported") / §4.7 ("never
/// silently on the server-facing side"). Reuses `tracing::warn!` rather
/// than inventing a separate warnings channel — see DESIGN.md.
fn warn_dropped_part(dialect: &str, part_kind: &str, reason: &str) {
    tracing::warn!(dialect, part_kind, reason, "dropping unsupported content part during translation");
}

/// Splits a `data:<media-type>;base64,<payload>` URI into its media type
/// and base64 payload. Returns `None` for anything else — a plain
/// `http(s)://` URL, for instance — since translators don't fetch content
/// themselves (spec.md §9 "defer to upstream").
fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.split(';').next().unwrap_or_default();
    (!media_type.is_empty() && !data.is_empty()).then_some((media_type, data))
}

/// Guesses a MIME type from a URL's extension, for dialects that require
/// one alongside a file reference they otherwise pass through verbatim.
fn guess_mime_type(url: &str, default: &str) -> String {
    let ext = url.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        _ => default,
    }
    .to_string()
}

#[cfg(test)]
mod shared_tests {
    use super::*;

    #[test]
    fn parse_data_url_extracts_media_type_and_payload() {
        let (media_type, data) = parse_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(media_type, "image/png");
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn parse_data_url_rejects_plain_urls() {
        assert!(parse_data_url("https://example.com/cat.png").is_none());
    }

    #[test]
    fn guess_mime_type_falls_back_to_default_for_unknown_extension() {
        assert_eq!(guess_mime_type("https://example.com/blob", "image/jpeg"), "image/jpeg");
        assert_eq!(guess_mime_type("https://example.com/cat.PNG", "image/jpeg"), "image/png");
    }
}

/// Map an already-OpenAI-shaped chunk into canonical stream frames: one
/// [`StreamFrame::Event`] per choice delta, plus a trailing
/// [`StreamFrame::Done`] when the chunk carries usage (the terminal chunk
/// under `stream_options.include_usage`).
#[must_use]
pub fn stream_frames_from_chat_chunk(chunk: ChatChunk) -> Vec<StreamFrame> {
    let mut frames: Vec<StreamFrame> = chunk
        .choices
        .into_iter()
        .map(|choice| {
            StreamFrame::Event(StreamEvent {
                choice_index: choice.index,
                role: choice.delta.role,
                content_delta: choice.delta.content,
                tool_call_delta: choice.delta.tool_calls.and_then(|mut v| {
                    if v.is_empty() {
                        None
                    } else {
                        Some(v.remove(0))
                    }
                }),
                finish_reason: choice.finish_reason,
            })
        })
        .collect();

    if let Some(usage) = chunk.usage {
        frames.push(StreamFrame::Done { usage: Some(usage) });
    }
    frames
}
