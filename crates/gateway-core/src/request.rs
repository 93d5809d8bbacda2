//! The canonical chat request: the OpenAI chat-completions dialect used as
//! the lingua franca inside protocol mode.

use crate::error::GatewayError;
use crate::types::{MaxTokens, ModelId, RequestId, Temperature, TopP};
use serde::{Deserialize, Serialize};

/// Canonical chat request, accepted by every `protocol`-mode endpoint
/// regardless of the upstream provider it will be translated to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRequest {
    /// Request identifier, generated if the caller omitted one.
    #[serde(default = "RequestId::generate")]
    pub id: RequestId,

    /// Target model identifier, e.g. `"claude-3-sonnet"`.
    pub model: String,

    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Deterministic-generation seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Tool/function definitions available to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    /// Tool choice directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Whether the caller wants a server-sent-events stream.
    #[serde(default)]
    pub stream: bool,
}

impl CanonicalRequest {
    /// Validate the request per spec.md §3 invariants.
    ///
    /// # Errors
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        ModelId::new(&self.model)?;

        if self.messages.is_empty() {
            return Err(GatewayError::invalid_request(
                "messages cannot be empty",
                "empty_messages",
            ));
        }

        if let Some(t) = self.temperature {
            Temperature::new(t)?;
        }
        if let Some(p) = self.top_p {
            TopP::new(p)?;
        }
        if let Some(m) = self.max_tokens {
            MaxTokens::new(m)?;
        }

        Ok(())
    }

    /// All messages with [`MessageRole::System`], concatenated in order.
    ///
    /// Used by translators whose target dialect separates system content
    /// from the chat (Anthropic, Gemini) per spec.md §4.6.
    #[must_use]
    pub fn system_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .filter_map(|m| m.content.as_text())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// Non-system messages, in original order, for dialects that fold the
    /// system prompt out-of-band.
    pub fn conversation_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != MessageRole::System)
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role.
    pub role: MessageRole,

    /// Message content: plain text or multimodal parts.
    pub content: MessageContent,

    /// Tool calls the assistant made in this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// For `role: tool` messages, the call this is a response to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Build a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System/instruction message.
    System,
    /// End-user message.
    User,
    /// Model-authored message.
    Assistant,
    /// Tool-call result.
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        };
        write!(f, "{s}")
    }
}

/// Message content: a plain string or an ordered list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain-text content.
    Text(String),
    /// Multimodal content parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Borrow the content as text, if this is the text variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Parts(_) => None,
        }
    }

    /// Render as a list of parts, synthesizing a single `Text` part if this
    /// content is the plain-text variant.
    #[must_use]
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            Self::Text(s) => vec![ContentPart::Text { text: s.clone() }],
            Self::Parts(parts) => parts.clone(),
        }
    }
}

/// One part of a multimodal message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image reference.
    ImageUrl {
        /// Image source.
        image_url: ImageUrl,
    },
    /// A document reference.
    Document {
        /// Document source.
        source: DocumentSource,
    },
}

/// Image source for a [`ContentPart::ImageUrl`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    /// URL, or a `data:` URI for inline base64.
    pub url: String,
}

/// Document source for a [`ContentPart::Document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    /// An upstream-fetchable URL. Passed through verbatim to providers that
    /// accept URL documents; otherwise the translator fetches
    /// and inlines it, per the "defer to upstream" default.
    Url {
        /// The document URL.
        url: String,
    },
    /// Inline base64-encoded document bytes.
    Base64 {
        /// MIME type, e.g. `"application/pdf"`.
        media_type: String,
        /// Base64-encoded bytes.
        data: String,
    },
}

/// A tool/function definition offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type; currently always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function definition.
    pub function: FunctionDefinition,
}

/// Function definition for a [`ToolDefinition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the function's parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this call.
    pub id: String,
    /// Tool type; currently always `"function"`.
    #[serde(rename = "type")]
    pub tool_type: String,
    /// The function invocation.
    pub function: FunctionCall,
}

/// Function invocation details of a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments, as a JSON-encoded string (mirrors the OpenAI wire shape).
    pub arguments: String,
}

/// Tool-choice directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// `"none"`, `"auto"`, or `"required"`.
    Mode(String),
    /// A specific function to call.
    Specific {
        /// Tool type; currently always `"function"`.
        #[serde(rename = "type")]
        tool_type: String,
        /// Which function.
        function: ToolChoiceFunction,
    },
}

/// Named function target of a [`ToolChoice::Specific`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolChoiceFunction {
    /// Function name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_request(messages: Vec<ChatMessage>) -> CanonicalRequest {
        CanonicalRequest {
            id: RequestId::generate(),
            model: "gpt-4".into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stop: None,
            seed: None,
            tools: None,
            tool_choice: None,
            stream: false,
        }
    }

    #[test]
    fn validate_rejects_empty_messages() {
        assert!(bare_request(vec![]).validate().is_err());
    }

    #[test]
    fn system_text_concatenates_in_order() {
        let req = bare_request(vec![
            ChatMessage::system("be terse"),
            ChatMessage::system("reply in english"),
            ChatMessage::user("hi"),
        ]);
        assert_eq!(req.system_text().unwrap(), "be terse\nreply in english");
        assert_eq!(req.conversation_messages().count(), 1);
    }

    #[test]
    fn message_content_text_serializes_as_bare_string() {
        let content = MessageContent::Text("hi".into());
        assert_eq!(serde_json::to_string(&content).unwrap(), "\"hi\"");
    }

    #[test]
    fn validate_rejects_out_of_range_sampling_params() {
        let mut req = bare_request(vec![ChatMessage::user("hi")]);
        req.temperature = Some(3.0);
        assert!(req.validate().is_err());
    }
}
