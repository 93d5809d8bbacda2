//! The identity pair: the canonical shape already *is* OpenAI's
//! chat-completions wire shape, so this dialect only needs to re-serialize.

use super::DialectTranslator;
use gateway_core::{CanonicalRequest, CanonicalResponse, Dialect, GatewayError, StreamFrame};

/// Translator for [`Dialect::Openai`]: a pure re-serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenaiIdentityTranslator;

impl DialectTranslator for OpenaiIdentityTranslator {
    fn dialect(&self) -> Dialect {
        Dialect::Openai
    }

    fn to_native(&self, request: &CanonicalRequest) -> Result<serde_json::Value, GatewayError> {
        serde_json::to_value(request)
            .map_err(|e| super::translation_error("openai", e))
    }

    fn from_native(
        &self,
        native: serde_json::Value,
        started_at: i64,
    ) -> Result<CanonicalResponse, GatewayError> {
        let mut response: CanonicalResponse =
            serde_json::from_value(native).map_err(|e| super::translation_error("openai", e))?;
        // The protocol path always rewrites the id and stamps the
        // dispatcher's own request-start time, even for this identity
        // dialect — transparent mode is what preserves the upstream id.
        response.id = super::synthesize_response_id();
        response.created = started_at;
        Ok(response)
    }

    fn decode_frame(
        &self,
        native: serde_json::Value,
        _id: &str,
        _created: i64,
        _model: &str,
    ) -> Result<Vec<StreamFrame>, GatewayError> {
        serde_json::from_value(native)
            .map(super::stream_frames_from_chat_chunk)
            .map_err(|e| super::translation_error("openai", e))
    }
}
