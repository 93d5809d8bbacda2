//! Request signers/authenticators.
//!
//! Each signer is pure given its inputs: a credential and the current time
//! in, a mutated [`OutboundRequest`] out. No signer performs I/O or holds
//! state across calls.

mod api_key;
mod azure_api_key;
mod bearer;
mod oauth2;
mod sigv4;

pub use api_key::ApiKeyHeaderSigner;
pub use azure_api_key::AzureApiKeySigner;
pub use bearer::BearerSigner;
pub use oauth2::OAuth2BearerSigner;
pub use sigv4::SigV4Signer;

use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError, ProviderKind};

/// Attaches provider-specific authentication to an [`OutboundRequest`].
pub trait Signer: Send + Sync {
    /// Mutate `request` in place, attaching whatever headers (and, for
    /// SigV4, canonicalization-derived values) this scheme requires.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if `credential` is not a kind this
    /// signer understands — a configuration error, since an instance's
    /// credential strategies are declared alongside its provider kind.
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError>;
}

fn mismatched_credential(signer: &str, credential: &Credential) -> GatewayError {
    GatewayError::Internal(format!(
        "{signer} cannot sign with a {} credential",
        credential.kind()
    ))
}

/// Pick the signer for a provider's elected credential:
/// Bedrock always SigV4; Vertex always OAuth2 bearer (GCP tokens only);
/// Azure picks its header scheme from which kind of credential was
/// actually elected (a workload-identity strategy yields an AAD bearer
/// token, a key-vault/mounted-secret strategy yields a static API key);
/// OpenAI/IBM/Oracle use a plain bearer; Anthropic uses its `x-api-key`
/// header (the dispatcher adds `anthropic-version` separately).
#[must_use]
pub fn signer_for(provider: ProviderKind, credential: &Credential, region: &str) -> Box<dyn Signer> {
    match provider {
        ProviderKind::Bedrock => Box::new(SigV4Signer::bedrock(region.to_string())),
        ProviderKind::Vertex => Box::new(OAuth2BearerSigner),
        ProviderKind::Azure => match credential {
            Credential::AzureToken { .. } => Box::new(OAuth2BearerSigner),
            _ => Box::new(AzureApiKeySigner),
        },
        ProviderKind::Anthropic => Box::new(ApiKeyHeaderSigner::anthropic()),
        ProviderKind::Openai | ProviderKind::Ibm | ProviderKind::Oracle => Box::new(BearerSigner),
    }
}
