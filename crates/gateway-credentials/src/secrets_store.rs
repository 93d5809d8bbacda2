//! Cloud-provider secrets stores: AWS Secrets Manager, Azure Key Vault,
//! GCP Secret Manager. Each reads one named secret; the
//! payload is parsed as JSON if it is JSON, otherwise treated as an
//! opaque string. None of the three report a lease, so expiry defaults
//! to 24 hours unless the store says otherwise (none currently do).

use crate::strategy::{CredentialStrategy, StrategyKind};
use async_trait::async_trait;
use gateway_core::{Credential, GatewayError};
use serde::Deserialize;
use std::time::{Duration, SystemTime};

const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Interpret a secret payload the same way [`crate::vault::VaultStrategy`]
/// shapes Vault's key/value map: an AWS-style bundle, a structured
/// API-key object, or an opaque string if it isn't JSON at all.
fn shape_payload(raw: &str, expires_at: Option<SystemTime>) -> Credential {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw) {
        let as_str = |k: &str| map.get(k).and_then(|v| v.as_str()).map(str::to_string);

        if let (Some(access_key_id), Some(secret_access_key)) =
            (as_str("access_key_id").or_else(|| as_str("access_key")), as_str("secret_access_key").or_else(|| as_str("secret_key")))
        {
            return Credential::Aws {
                access_key_id,
                secret_access_key,
                session_token: as_str("session_token"),
                expires_at,
            };
        }

        if let Some(key) = as_str("api_key").or_else(|| as_str("value")).or_else(|| as_str("key")) {
            return Credential::ApiKey { key, expires_at };
        }
    }

    Credential::ApiKey {
        key: raw.trim().to_string(),
        expires_at,
    }
}

/// AWS Secrets Manager, read via the `GetSecretValue` JSON API (signed
/// with the instance's already-elected AWS credential material in a real
/// deployment; here the strategy holds its own bearer-equivalent access
/// key pair, treating Secrets Manager as an independent strategy rather
/// than layering it under SigV4 signing).
pub struct AwsSecretsManagerStrategy {
    name: String,
    region: String,
    secret_id: String,
    endpoint_override: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    client: reqwest::Client,
}

impl AwsSecretsManagerStrategy {
    /// Build the strategy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        region: impl Into<String>,
        secret_id: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            secret_id: secret_id.into(),
            endpoint_override: None,
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the Secrets Manager endpoint (tests, VPC endpoints).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    fn endpoint(&self) -> String {
        self.endpoint_override.clone().unwrap_or_else(|| {
            format!("https://secretsmanager.{}.amazonaws.com/", self.region)
        })
    }
}

#[async_trait]
impl CredentialStrategy for AwsSecretsManagerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AwsSecretsManager
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: no AWS credentials configured for Secrets Manager access",
                self.name
            )));
        }
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("X-Amz-Target", "secretsmanager.GetSecretValue")
            .header("Content-Type", "application/x-amz-json-1.1")
            .basic_auth(&self.access_key_id, Some(&self.secret_access_key))
            .json(&serde_json::json!({ "SecretId": self.secret_id }))
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: Secrets Manager call failed ({e})",
                    self.name
                ))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: Secrets Manager rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: AwsSecretValue = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed Secrets Manager response ({e})",
                self.name
            ))
        })?;

        let raw = body
            .secret_string
            .ok_or_else(|| GatewayError::service_unavailable(format!("{}: binary secrets not supported", self.name)))?;

        Ok(shape_payload(&raw, Some(SystemTime::now() + DEFAULT_EXPIRY)))
    }
}

#[derive(Debug, Deserialize)]
struct AwsSecretValue {
    #[serde(rename = "SecretString")]
    secret_string: Option<String>,
}

/// Azure Key Vault, read via `GET {vault}/secrets/{name}?api-version=...`
/// bearing an AAD bearer token.
pub struct AzureKeyVaultStrategy {
    name: String,
    vault_url: String,
    secret_name: String,
    api_version: String,
    bearer_token: String,
    client: reqwest::Client,
}

impl AzureKeyVaultStrategy {
    /// Build the strategy. `bearer_token` is a pre-acquired AAD token
    /// scoped to Key Vault (typically obtained once at process start via
    /// the same federation path as [`crate::workload_identity::AzureWorkloadIdentityStrategy`]).
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        vault_url: impl Into<String>,
        secret_name: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vault_url: vault_url.into(),
            secret_name: secret_name.into(),
            api_version: "7.4".to_string(),
            bearer_token: bearer_token.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CredentialStrategy for AzureKeyVaultStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AzureKeyVault
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if self.bearer_token.is_empty() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: no AAD token configured for Key Vault access",
                self.name
            )));
        }
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let url = format!(
            "{}/secrets/{}?api-version={}",
            self.vault_url.trim_end_matches('/'),
            self.secret_name,
            self.api_version
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!("{}: Key Vault call failed ({e})", self.name))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: Key Vault rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: AzureSecretBundle = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed Key Vault response ({e})",
                self.name
            ))
        })?;

        Ok(shape_payload(&body.value, Some(SystemTime::now() + DEFAULT_EXPIRY)))
    }
}

#[derive(Debug, Deserialize)]
struct AzureSecretBundle {
    value: String,
}

/// GCP Secret Manager, read via `GET
/// /v1/{secret_version}:access` bearing an OAuth2 bearer token.
pub struct GcpSecretManagerStrategy {
    name: String,
    project_id: String,
    secret_id: String,
    version: String,
    bearer_token: String,
    endpoint_override: Option<String>,
    client: reqwest::Client,
}

impl GcpSecretManagerStrategy {
    /// Build the strategy. `bearer_token` is a pre-acquired OAuth2 token
    /// scoped to Secret Manager.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        project_id: impl Into<String>,
        secret_id: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            secret_id: secret_id.into(),
            version: "latest".to_string(),
            bearer_token: bearer_token.into(),
            endpoint_override: None,
            client: reqwest::Client::new(),
        }
    }

    /// Override the Secret Manager API base (tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    fn endpoint(&self) -> String {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| "https://secretmanager.googleapis.com".to_string())
    }
}

#[async_trait]
impl CredentialStrategy for GcpSecretManagerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GcpSecretManager
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if self.bearer_token.is_empty() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: no OAuth2 token configured for Secret Manager access",
                self.name
            )));
        }
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/{}:access",
            self.endpoint(),
            self.project_id,
            self.secret_id,
            self.version
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: Secret Manager call failed ({e})",
                    self.name
                ))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: Secret Manager rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: GcpSecretAccessResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!(
                "{}: malformed Secret Manager response ({e})",
                self.name
            ))
        })?;

        let raw = base64_decode(&body.payload.data).ok_or_else(|| {
            GatewayError::service_unavailable(format!(
                "{}: secret payload is not valid base64",
                self.name
            ))
        })?;

        Ok(shape_payload(&raw, Some(SystemTime::now() + DEFAULT_EXPIRY)))
    }
}

#[derive(Debug, Deserialize)]
struct GcpSecretAccessResponse {
    payload: GcpSecretPayload,
}

#[derive(Debug, Deserialize)]
struct GcpSecretPayload {
    data: String,
}

fn base64_decode(data: &str) -> Option<String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_opaque_string_payload() {
        let cred = shape_payload("sk-plain", None);
        assert!(matches!(cred, Credential::ApiKey { key, .. } if key == "sk-plain"));
    }

    #[test]
    fn shapes_json_api_key_payload() {
        let cred = shape_payload(r#"{"api_key":"sk-json"}"#, None);
        assert!(matches!(cred, Credential::ApiKey { key, .. } if key == "sk-json"));
    }

    #[test]
    fn shapes_json_aws_bundle_payload() {
        let cred = shape_payload(
            r#"{"access_key_id":"AKIA","secret_access_key":"shh"}"#,
            None,
        );
        assert!(matches!(cred, Credential::Aws { access_key_id, .. } if access_key_id == "AKIA"));
    }

    #[tokio::test]
    async fn aws_secrets_manager_requires_credentials() {
        let strategy = AwsSecretsManagerStrategy::new("sm", "us-east-1", "my/secret", "", "");
        assert!(strategy.init().await.is_err());
    }

    #[tokio::test]
    async fn azure_key_vault_requires_bearer_token() {
        let strategy =
            AzureKeyVaultStrategy::new("kv", "https://vault.vault.azure.net", "secret", "");
        assert!(strategy.init().await.is_err());
    }
}
