//! The canonical chat response: mirrors OpenAI's chat-completions object.

use crate::request::ToolCall;
use serde::{Deserialize, Serialize};

/// Canonical chat-completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalResponse {
    /// Response id, shape `chatcmpl-<8 hex chars>`.
    ///
    /// In transparent mode the upstream's own id is preserved instead; this
    /// field is only ever synthesized on the protocol path.
    pub id: String,
    /// Object discriminator, always `"chat.completion"`.
    #[serde(default = "default_object")]
    pub object: String,
    /// Epoch-seconds timestamp of the dispatcher's request-start time.
    pub created: i64,
    /// Echoes the request's model.
    pub model: String,
    /// Completion choices.
    pub choices: Vec<Choice>,
    /// Token accounting.
    pub usage: Usage,
}

fn default_object() -> String {
    "chat.completion".to_string()
}

/// One completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index within `choices`.
    pub index: u32,
    /// The generated message.
    pub message: ResponseMessage,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

/// A model-authored message in a [`Choice`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Always `"assistant"`.
    pub role: String,
    /// Text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Canonical finish-reason set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop.
    Stop,
    /// Hit `max_tokens`.
    Length,
    /// Model emitted tool calls.
    ToolCalls,
    /// Upstream content filter intervened.
    ContentFilter,
    /// Generation ended due to an error.
    Error,
}

/// Token accounting. When the upstream omits usage, fields default to `0`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Sum of the two.
    pub total_tokens: u32,
}

impl Usage {
    /// Build a usage block, computing `total_tokens`.
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A model available through `/v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    /// Model identifier.
    pub id: String,
    /// Always `"model"`.
    #[serde(default = "default_model_object")]
    pub object: String,
    /// Owning instance name.
    pub owned_by: String,
}

fn default_model_object() -> String {
    "model".to_string()
}

/// Envelope for `GET /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always `"list"`.
    #[serde(default = "default_list_object")]
    pub object: String,
    /// Enumerated models.
    pub data: Vec<ModelObject>,
}

fn default_list_object() -> String {
    "list".to_string()
}
