//! # Gateway Core
//!
//! Canonical types shared by every other crate in the gateway: the
//! request/response/streaming model callers and translators speak, the
//! instance and credential shapes the registry and dispatcher resolve
//! against, the platform-capability record, and the error taxonomy.
//!
//! This crate holds data and pure logic only — no I/O, no network calls,
//! no async. Everything here is deterministic and directly unit-testable.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod error;
pub mod instance;
pub mod platform;
pub mod request;
pub mod response;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use credential::{Credential, EXPIRY_SKEW};
pub use error::{CanonicalErrorBody, GatewayError, GatewayResult};
pub use instance::{
    Dialect, Instance, Mode, PathBinding, ProviderKind, ProviderLocation, TranslationPair,
};
pub use platform::PlatformCapabilities;
pub use request::{
    CanonicalRequest, ChatMessage, ContentPart, DocumentSource, FunctionCall, FunctionDefinition,
    ImageUrl, MessageContent, MessageRole, ToolCall, ToolChoice, ToolChoiceFunction,
    ToolDefinition,
};
pub use response::{
    CanonicalResponse, Choice, FinishReason, ModelObject, ModelsResponse, ResponseMessage, Usage,
};
pub use streaming::{ChatChunk, ChunkChoice, ChunkDelta, StreamEvent, StreamFrame};
pub use types::{InstanceName, MaxTokens, ModelId, RequestId, Temperature, TenantId, TopP};
