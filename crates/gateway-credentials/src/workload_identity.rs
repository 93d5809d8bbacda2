//! Workload-identity strategies: exchange a platform-mounted token for a
//! short-lived cloud-native credential without any embedded secret
//!. Each variant is ineligible —
//! `init` fails — if the platform detector did not see its corresponding
//! ambient signal.

use crate::strategy::{CredentialStrategy, StrategyKind};
use async_trait::async_trait;
use gateway_core::{Credential, GatewayError, PlatformCapabilities};
use regex::Regex;
use serde::Deserialize;
use std::time::{Duration, SystemTime};

/// AWS IRSA-style federation: `sts:AssumeRoleWithWebIdentity` exchanging
/// the mounted web-identity token for temporary credentials, cached until
/// 5 minutes before expiry (the credential's own `is_fresh`, not a
/// strategy-local cache).
pub struct AwsWorkloadIdentityStrategy {
    name: String,
    role_arn: String,
    token_file: String,
    region: String,
    sts_endpoint_override: Option<String>,
    client: reqwest::Client,
    detected: bool,
}

impl AwsWorkloadIdentityStrategy {
    /// Build the strategy from explicit configuration, gated by whether
    /// the platform detector saw the AWS web-identity signal.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        role_arn: impl Into<String>,
        token_file: impl Into<String>,
        region: impl Into<String>,
        caps: &PlatformCapabilities,
    ) -> Self {
        Self {
            name: name.into(),
            role_arn: role_arn.into(),
            token_file: token_file.into(),
            region: region.into(),
            sts_endpoint_override: None,
            client: reqwest::Client::new(),
            detected: caps.aws_web_identity,
        }
    }

    /// Override the STS endpoint, e.g. for regional STS or test servers.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sts_endpoint_override = Some(endpoint.into());
        self
    }

    fn sts_url(&self) -> String {
        self.sts_endpoint_override.clone().unwrap_or_else(|| {
            format!("https://sts.{}.amazonaws.com/", self.region)
        })
    }
}

#[async_trait]
impl CredentialStrategy for AwsWorkloadIdentityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WorkloadIdentity
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if !self.detected {
            return Err(GatewayError::service_unavailable(format!(
                "{}: AWS web identity not detected on this platform",
                self.name
            )));
        }
        tokio::fs::metadata(&self.token_file).await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: web identity token file unreadable ({e})",
                self.name
            ))
        })?;
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let token = tokio::fs::read_to_string(&self.token_file)
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: cannot read web identity token ({e})",
                    self.name
                ))
            })?;

        let session_name = format!("gateway-{}", self.name);
        let query = [
            ("Action", "AssumeRoleWithWebIdentity"),
            ("Version", "2011-06-15"),
            ("RoleArn", self.role_arn.as_str()),
            ("RoleSessionName", session_name.as_str()),
            ("WebIdentityToken", token.trim()),
        ];

        let response = self
            .client
            .get(self.sts_url())
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!("{}: STS call failed ({e})", self.name))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: STS rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            GatewayError::service_unavailable(format!("{}: STS body unreadable ({e})", self.name))
        })?;

        parse_sts_response(&body, &self.name)
    }
}

/// Extract the four AWS credential fields out of the XML body STS
/// returns. Hand-rolled against a fixed, flat tag shape rather than a
/// full XML parser, since `AssumeRoleWithWebIdentityResponse` never nests
/// these fields.
fn parse_sts_response(body: &str, strategy_name: &str) -> Result<Credential, GatewayError> {
    let field = |tag: &str| -> Option<String> {
        let pattern = format!(r"<{tag}>([^<]*)</{tag}>");
        Regex::new(&pattern)
            .ok()
            .and_then(|re| re.captures(body))
            .map(|c| c[1].to_string())
    };

    let access_key_id = field("AccessKeyId").ok_or_else(|| {
        GatewayError::service_unavailable(format!(
            "{strategy_name}: malformed STS response (missing AccessKeyId)"
        ))
    })?;
    let secret_access_key = field("SecretAccessKey").ok_or_else(|| {
        GatewayError::service_unavailable(format!(
            "{strategy_name}: malformed STS response (missing SecretAccessKey)"
        ))
    })?;
    let session_token = field("SessionToken");
    let expires_at = field("Expiration").and_then(|raw| {
        chrono::DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| SystemTime::from(dt.with_timezone(&chrono::Utc)))
    });

    Ok(Credential::Aws {
        access_key_id,
        secret_access_key,
        session_token,
        expires_at,
    })
}

/// Azure federated-identity: exchange the mounted federated token for an
/// AAD access token via the client-credentials-with-assertion flow.
pub struct AzureWorkloadIdentityStrategy {
    name: String,
    tenant_id: String,
    client_id: String,
    federated_token_file: String,
    scope: String,
    authority_override: Option<String>,
    client: reqwest::Client,
    detected: bool,
}

impl AzureWorkloadIdentityStrategy {
    /// Build the strategy, gated by the platform detector's Azure signal.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        federated_token_file: impl Into<String>,
        scope: impl Into<String>,
        caps: &PlatformCapabilities,
    ) -> Self {
        Self {
            name: name.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            federated_token_file: federated_token_file.into(),
            scope: scope.into(),
            authority_override: None,
            client: reqwest::Client::new(),
            detected: caps.azure_federated_identity,
        }
    }

    /// Override the AAD authority host, e.g. for sovereign clouds or tests.
    #[must_use]
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority_override = Some(authority.into());
        self
    }

    fn token_url(&self) -> String {
        let authority = self
            .authority_override
            .clone()
            .unwrap_or_else(|| "https://login.microsoftonline.com".to_string());
        format!(
            "{}/{}/oauth2/v2.0/token",
            authority.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

#[async_trait]
impl CredentialStrategy for AzureWorkloadIdentityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WorkloadIdentity
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if !self.detected {
            return Err(GatewayError::service_unavailable(format!(
                "{}: Azure federated identity not detected on this platform",
                self.name
            )));
        }
        tokio::fs::metadata(&self.federated_token_file)
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: federated token file unreadable ({e})",
                    self.name
                ))
            })?;
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let assertion = tokio::fs::read_to_string(&self.federated_token_file)
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: cannot read federated token ({e})",
                    self.name
                ))
            })?;

        let form = [
            ("client_id", self.client_id.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", "client_credentials"),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", assertion.trim()),
        ];

        let response = self
            .client
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: AAD token exchange failed ({e})",
                    self.name
                ))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: AAD rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: AadTokenResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed AAD token response ({e})",
                self.name
            ))
        })?;

        Ok(Credential::AzureToken {
            token: body.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(u64::from(body.expires_in)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AadTokenResponse {
    access_token: String,
    expires_in: u32,
}

/// GCP workload identity: either exchange a service-account JSON key
/// (Application Default Credentials) via a self-signed JWT assertion, or,
/// when no key file is configured, fetch a token from the metadata
/// server — the same two paths `gcloud`'s ADC resolution takes.
pub struct GcpWorkloadIdentityStrategy {
    name: String,
    credentials_file: Option<String>,
    scope: String,
    metadata_endpoint_override: Option<String>,
    client: reqwest::Client,
    detected: bool,
}

impl GcpWorkloadIdentityStrategy {
    /// Build the strategy, gated by the platform detector's GCP signal.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        credentials_file: Option<String>,
        scope: impl Into<String>,
        caps: &PlatformCapabilities,
    ) -> Self {
        Self {
            name: name.into(),
            credentials_file,
            scope: scope.into(),
            metadata_endpoint_override: None,
            client: reqwest::Client::new(),
            detected: caps.gcp_workload_identity,
        }
    }

    /// Override the metadata server base URL (tests).
    #[must_use]
    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint_override = Some(endpoint.into());
        self
    }

    fn metadata_url(&self) -> String {
        self.metadata_endpoint_override.clone().unwrap_or_else(|| {
            "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
                .to_string()
        })
    }

    async fn via_service_account_key(&self, path: &str) -> Result<Credential, GatewayError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: cannot read service account key ({e})",
                self.name
            ))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed service account key ({e})",
                self.name
            ))
        })?;

        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            iss: key.client_email.clone(),
            scope: self.scope.clone(),
            aud: key.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: invalid service account private key ({e})",
                    self.name
                ))
            })?;
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding_key,
        )
        .map_err(|e| {
            GatewayError::service_unavailable(format!("{}: JWT signing failed ({e})", self.name))
        })?;

        let form = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ];

        let response = self
            .client
            .post(&key.token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: token exchange failed ({e})",
                    self.name
                ))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: token endpoint rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: GcpTokenResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed token response ({e})",
                self.name
            ))
        })?;

        Ok(Credential::GcpToken {
            token: body.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(u64::from(body.expires_in)),
        })
    }

    async fn via_metadata_server(&self) -> Result<Credential, GatewayError> {
        let response = self
            .client
            .get(self.metadata_url())
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: metadata server unreachable ({e})",
                    self.name
                ))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: metadata server rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: GcpTokenResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed metadata response ({e})",
                self.name
            ))
        })?;

        Ok(Credential::GcpToken {
            token: body.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(u64::from(body.expires_in)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, serde::Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct GcpTokenResponse {
    access_token: String,
    expires_in: u32,
}

#[async_trait]
impl CredentialStrategy for GcpWorkloadIdentityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WorkloadIdentity
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if !self.detected {
            return Err(GatewayError::service_unavailable(format!(
                "{}: GCP workload identity not detected on this platform",
                self.name
            )));
        }
        if let Some(path) = &self.credentials_file {
            tokio::fs::metadata(path).await.map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: application credentials file unreadable ({e})",
                    self.name
                ))
            })?;
        }
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        match &self.credentials_file {
            Some(path) => self.via_service_account_key(path).await,
            None => self.via_metadata_server().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sts_assume_role_response() {
        let body = r#"<AssumeRoleWithWebIdentityResponse>
            <AssumeRoleWithWebIdentityResult>
                <Credentials>
                    <AccessKeyId>ASIAEXAMPLE</AccessKeyId>
                    <SecretAccessKey>secret</SecretAccessKey>
                    <SessionToken>token</SessionToken>
                    <Expiration>2030-01-01T00:00:00Z</Expiration>
                </Credentials>
            </AssumeRoleWithWebIdentityResult>
        </AssumeRoleWithWebIdentityResponse>"#;

        let cred = parse_sts_response(body, "test").unwrap();
        match cred {
            Credential::Aws {
                access_key_id,
                session_token,
                expires_at,
                ..
            } => {
                assert_eq!(access_key_id, "ASIAEXAMPLE");
                assert_eq!(session_token.as_deref(), Some("token"));
                assert!(expires_at.is_some());
            }
            other => panic!("expected Aws credential, got {other:?}"),
        }
    }

    #[test]
    fn rejects_response_missing_access_key() {
        let body = "<AssumeRoleWithWebIdentityResponse></AssumeRoleWithWebIdentityResponse>";
        assert!(parse_sts_response(body, "test").is_err());
    }

    #[tokio::test]
    async fn aws_strategy_ineligible_without_detection() {
        let strategy = AwsWorkloadIdentityStrategy::new(
            "aws",
            "arn:aws:iam::123:role/gw",
            "/var/run/secrets/eks.amazonaws.com/serviceaccount/token",
            "us-east-1",
            &PlatformCapabilities::none(),
        );
        assert!(strategy.init().await.is_err());
    }
}
