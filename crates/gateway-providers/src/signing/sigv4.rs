//! AWS Signature Version 4, hand-rolled over `sha2`/`hmac`.

use super::{mismatched_credential, Signer};
use crate::outbound::OutboundRequest;
use chrono::{DateTime, Utc};
use gateway_core::{Credential, GatewayError};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signs a request for a single AWS service in a single region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Build a signer for `service` (e.g. `"bedrock"`) in `region`.
    #[must_use]
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Build a signer for the Bedrock runtime service.
    #[must_use]
    pub fn bedrock(region: impl Into<String>) -> Self {
        Self::new(region, "bedrock")
    }
}

impl Signer for SigV4Signer {
    fn sign(
        &self,
        request: &mut OutboundRequest,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let Credential::Aws {
            access_key_id,
            secret_access_key,
            session_token,
            ..
        } = credential
        else {
            return Err(mismatched_credential("SigV4Signer", credential));
        };

        let url = url::Url::parse(&request.url)
            .map_err(|e| GatewayError::Internal(format!("invalid upstream url: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| GatewayError::Internal("upstream url has no host".to_string()))?
            .to_string();
        let path = if url.path().is_empty() { "/" } else { url.path() }.to_string();

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(sha256(&request.body));

        request.set_header("host", &host);
        request.set_header("x-amz-date", &amz_date);
        request.set_header("x-amz-content-sha256", &payload_hash);
        if let Some(token) = session_token {
            request.set_header("x-amz-security-token", token);
        }

        let mut signed_header_names: Vec<&str> =
            request.headers.keys().map(String::as_str).collect();
        signed_header_names.sort_unstable();
        let signed_headers = signed_header_names.join(";");

        let mut canonical_headers = String::new();
        for name in &signed_header_names {
            let value = request.headers.get(*name).map(String::as_str).unwrap_or_default();
            canonical_headers.push_str(name);
            canonical_headers.push(':');
            canonical_headers.push_str(value.trim());
            canonical_headers.push('\n');
        }

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            request.method, path, canonical_headers, signed_headers, payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm,
            amz_date,
            credential_scope,
            hex::encode(sha256(canonical_request.as_bytes()))
        );

        let k_date = hmac(format!("AWS4{secret_access_key}").as_bytes(), date_stamp.as_bytes());
        let k_region = hmac(&k_date, self.region.as_bytes());
        let k_service = hmac(&k_region, self.service.as_bytes());
        let k_signing = hmac(&k_service, b"aws4_request");
        let signature = hex::encode(hmac(&k_signing, string_to_sign.as_bytes()));

        let authorization = format!(
            "{algorithm} Credential={access_key_id}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
        );
        request.set_header("authorization", authorization);

        Ok(())
    }
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hmac(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts a key of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn aws_credential() -> Credential {
        Credential::Aws {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
            expires_at: None,
        }
    }

    #[test]
    fn signs_and_sets_authorization_header() {
        let signer = SigV4Signer::bedrock("us-east-1");
        let mut request = OutboundRequest::json_post(
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/claude/converse",
            Bytes::from_static(b"{}"),
        );
        let now = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        signer.sign(&mut request, &aws_credential(), now).unwrap();

        let auth = request.headers.get("authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/us-east-1/bedrock/aws4_request"));
        assert!(request.headers.contains_key("x-amz-date"));
        assert!(!request.headers.contains_key("x-amz-security-token"));
    }

    #[test]
    fn session_token_is_included_when_present() {
        let signer = SigV4Signer::bedrock("us-east-1");
        let mut request = OutboundRequest::json_post(
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/claude/converse",
            Bytes::from_static(b"{}"),
        );
        let credential = Credential::Aws {
            access_key_id: "AKID".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: Some("token".to_string()),
            expires_at: None,
        };
        signer.sign(&mut request, &credential, Utc::now()).unwrap();
        assert_eq!(request.headers.get("x-amz-security-token").unwrap(), "token");
    }

    #[test]
    fn rejects_non_aws_credential() {
        let signer = SigV4Signer::bedrock("us-east-1");
        let mut request = OutboundRequest::json_post("https://example.com", Bytes::new());
        let credential = Credential::ApiKey {
            key: "sk-test".to_string(),
            expires_at: None,
        };
        assert!(signer.sign(&mut request, &credential, Utc::now()).is_err());
    }
}
