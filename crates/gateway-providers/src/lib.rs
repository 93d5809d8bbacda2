//! # Gateway Providers
//!
//! Outbound request construction for the LLM Inference Gateway: request
//! signing, per-dialect protocol translation, and the retrying HTTP client
//! that talks to upstream providers.
//!
//! - [`outbound::OutboundRequest`], the signer-agnostic request shape
//! - [`url`], per-provider upstream URL composition
//! - [`signing`], per-credential-kind request signers
//! - [`translate`], per-dialect request/response translation
//! - [`client::ProviderClient`], the retrying reqwest wrapper

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod outbound;
pub mod signing;
pub mod translate;
pub mod url;

pub use client::sse::json_frames;
pub use client::ProviderClient;
pub use outbound::OutboundRequest;
pub use signing::{signer_for, Signer};
pub use translate::{translator_for, DialectTranslator};
pub use url::{base_url, protocol_invoke_url, transparent_url};
