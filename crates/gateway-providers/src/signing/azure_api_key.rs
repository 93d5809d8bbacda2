//! Azure OpenAI's `api-key` header convention, distinct from `Authorization`.

use super::{mismatched_credential, Signer};
use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError};

/// Attaches an [`Credential::ApiKey`] value to Azure's `api-key` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct AzureApiKeySigner;

impl Signer for AzureApiKeySigner {
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        _now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let Credential::ApiKey { key, .. } = credential else {
            return Err(mismatched_credential("AzureApiKeySigner", credential));
        };
        request.set_header("api-key", key.clone());
        Ok(())
    }
}
