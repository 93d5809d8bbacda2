//! Raw API-key header signing, for providers that want the key verbatim in
//! a custom header rather than a `Bearer` scheme (Anthropic's `x-api-key`).

use super::{mismatched_credential, Signer};
use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError};

/// Attaches an [`Credential::ApiKey`] value verbatim to a named header.
#[derive(Debug, Clone)]
pub struct ApiKeyHeaderSigner {
    header_name: String,
}

impl ApiKeyHeaderSigner {
    /// Build a signer writing the key into `header_name`.
    #[must_use]
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }

    /// Anthropic's `x-api-key` convention.
    #[must_use]
    pub fn anthropic() -> Self {
        Self::new("x-api-key")
    }
}

impl Signer for ApiKeyHeaderSigner {
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        _now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let Credential::ApiKey { key, .. } = credential else {
            return Err(mismatched_credential("ApiKeyHeaderSigner", credential));
        };
        request.set_header(&self.header_name, key.clone());
        Ok(())
    }
}
