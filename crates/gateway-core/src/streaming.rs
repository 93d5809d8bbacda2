//! Canonical streaming delta events (spec.md §3 "Canonical chat stream
//! event") and the sentinel that terminates a stream.

use crate::request::ToolCall;
use crate::response::{FinishReason, Usage};
use serde::{Deserialize, Serialize};

/// One canonical chunk, mirroring an OpenAI `chat.completion.chunk` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Same id across every chunk of one response.
    pub id: String,
    /// Always `"chat.completion.chunk"`.
    #[serde(default = "default_chunk_object")]
    pub object: String,
    /// Epoch-seconds timestamp, constant across chunks of one response.
    pub created: i64,
    /// Echoes the request's model.
    pub model: String,
    /// Per-choice deltas (normally a single entry).
    pub choices: Vec<ChunkChoice>,
    /// Present only on the terminal chunk, once the upstream reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

fn default_chunk_object() -> String {
    "chat.completion.chunk".to_string()
}

/// One choice's delta within a [`ChatChunk`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Index of the choice this delta belongs to.
    pub index: u32,
    /// The incremental content.
    pub delta: ChunkDelta,
    /// Present only on the final chunk for this choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Incremental content of a [`ChunkChoice`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkDelta {
    /// Present only on the first chunk of a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Incremental text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Incremental tool-call fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// A single event in the internal delta stream the translator produces
/// before it is serialized to SSE (spec.md §3 "Canonical chat stream
/// event").
#[derive(Debug, Clone)]
pub struct StreamEvent {
    /// Which choice this delta belongs to.
    pub choice_index: u32,
    /// Present only on the first event for a choice.
    pub role: Option<String>,
    /// Incremental text, if any.
    pub content_delta: Option<String>,
    /// Incremental tool-call fragment, if any.
    pub tool_call_delta: Option<ToolCall>,
    /// Present only on the final event for a choice.
    pub finish_reason: Option<FinishReason>,
}

impl StreamEvent {
    /// Build a plain content delta.
    #[must_use]
    pub fn content(choice_index: u32, content: impl Into<String>) -> Self {
        Self {
            choice_index,
            role: None,
            content_delta: Some(content.into()),
            tool_call_delta: None,
            finish_reason: None,
        }
    }

    /// Build the terminal delta for a choice.
    #[must_use]
    pub fn finish(choice_index: u32, finish_reason: FinishReason) -> Self {
        Self {
            choice_index,
            role: None,
            content_delta: None,
            tool_call_delta: None,
            finish_reason: Some(finish_reason),
        }
    }
}

/// A fully decoded stream, as a lazy sequence with explicit end-of-stream
/// and error markers; no callbacks.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    /// A content/tool-call delta.
    Event(StreamEvent),
    /// The stream ended normally. Emitted exactly once, last.
    Done {
        /// Usage, if the upstream reported it.
        usage: Option<Usage>,
    },
    /// The stream failed after at least one byte reached the caller.
    Error {
        /// Human-readable detail.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_chunk_roundtrips_without_usage() {
        let chunk = ChatChunk {
            id: "chatcmpl-deadbeef".into(),
            object: default_chunk_object(),
            created: 0,
            model: "claude-3-sonnet".into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: Some("assistant".into()),
                    content: Some("hi".into()),
                    tool_calls: None,
                },
                finish_reason: None,
            }],
            usage: None,
        };
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(!json.contains("\"usage\""));
    }
}
