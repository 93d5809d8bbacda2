//! `Authorization: Bearer <token>` signing for OAuth2-style cloud tokens
//! (Azure AAD, GCP ADC) as opposed to long-lived API keys.

use super::{mismatched_credential, Signer};
use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError};

/// Attaches `Authorization: Bearer <token>` from an Azure or GCP token
/// credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuth2BearerSigner;

impl Signer for OAuth2BearerSigner {
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        _now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let token = match credential {
            Credential::AzureToken { token, .. } | Credential::GcpToken { token, .. } => token,
            _ => return Err(mismatched_credential("OAuth2BearerSigner", credential)),
        };
        request.set_header("authorization", format!("Bearer {token}"));
        Ok(())
    }
}
