//! Plain `Authorization: Bearer <key>` signing, for API-key credentials
//! (OpenAI-compatible providers).

use super::{mismatched_credential, Signer};
use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError};

/// Attaches `Authorization: Bearer <key>` from an [`Credential::ApiKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerSigner;

impl Signer for BearerSigner {
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        _now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let Credential::ApiKey { key, .. } = credential else {
            return Err(mismatched_credential("BearerSigner", credential));
        };
        request.set_header("authorization", format!("Bearer {key}"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn sets_bearer_header() {
        let mut request = OutboundRequest::json_post("https://api.openai.com/v1/chat/completions", Bytes::new());
        let credential = Credential::ApiKey {
            key: "sk-test".to_string(),
            expires_at: None,
        };
        BearerSigner.sign(&mut request, &credential, Utc::now()).unwrap();
        assert_eq!(request.headers.get("authorization").unwrap(), "Bearer sk-test");
    }
}
