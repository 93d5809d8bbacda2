//! HashiCorp Vault strategy: Kubernetes auth method, then a KV/dynamic
//! secret read.

use crate::strategy::{CredentialStrategy, StrategyKind};
use async_trait::async_trait;
use gateway_core::{Credential, GatewayError};
use serde::Deserialize;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Reads a secret from Vault, authenticating via the Kubernetes auth
/// method with the pod's mounted service-account token.
pub struct VaultStrategy {
    name: String,
    vault_addr: String,
    auth_mount: String,
    role: String,
    service_account_token_path: String,
    secret_path: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl VaultStrategy {
    /// Build a Vault strategy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        vault_addr: impl Into<String>,
        role: impl Into<String>,
        secret_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vault_addr: vault_addr.into(),
            auth_mount: "kubernetes".to_string(),
            role: role.into(),
            service_account_token_path:
                "/var/run/secrets/kubernetes.io/serviceaccount/token".to_string(),
            secret_path: secret_path.into(),
            client: reqwest::Client::new(),
            token: RwLock::new(None),
        }
    }

    /// Override the default service-account token mount path.
    #[must_use]
    pub fn with_service_account_token_path(mut self, path: impl Into<String>) -> Self {
        self.service_account_token_path = path.into();
        self
    }

    async fn login(&self) -> Result<String, GatewayError> {
        let jwt = tokio::fs::read_to_string(&self.service_account_token_path)
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!(
                    "{}: cannot read service account token ({e})",
                    self.name
                ))
            })?;

        let url = format!(
            "{}/v1/auth/{}/login",
            self.vault_addr.trim_end_matches('/'),
            self.auth_mount
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "role": self.role, "jwt": jwt.trim() }))
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!("{}: vault login failed ({e})", self.name))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: vault login rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: VaultLoginResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!("{}: malformed vault login response ({e})", self.name))
        })?;

        Ok(body.auth.client_token)
    }

    async fn read_secret(&self, token: &str) -> Result<Credential, GatewayError> {
        let url = format!(
            "{}/v1/{}",
            self.vault_addr.trim_end_matches('/'),
            self.secret_path.trim_start_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| {
                GatewayError::service_unavailable(format!("{}: vault read failed ({e})", self.name))
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::service_unavailable(format!(
                "{}: vault read rejected (status {})",
                self.name,
                response.status()
            )));
        }

        let body: VaultSecretResponse = response.json().await.map_err(|e| {
            GatewayError::service_unavailable(format!("{}: malformed vault secret response ({e})", self.name))
        })?;

        let expires_at = SystemTime::now() + Duration::from_secs(u64::from(body.lease_duration));
        Ok(shape_vault_data(body.data, Some(expires_at)))
    }
}

/// Interpret Vault's returned key/value map as whichever [`Credential`]
/// shape the keys suggest: an STS-style dynamic AWS bundle, a structured
/// API-key object, or a single opaque field.
fn shape_vault_data(
    data: serde_json::Map<String, serde_json::Value>,
    expires_at: Option<SystemTime>,
) -> Credential {
    let as_str = |k: &str| data.get(k).and_then(|v| v.as_str()).map(str::to_string);

    if let (Some(access_key_id), Some(secret_access_key)) =
        (as_str("access_key"), as_str("secret_key"))
    {
        return Credential::Aws {
            access_key_id,
            secret_access_key,
            session_token: as_str("security_token"),
            expires_at,
        };
    }

    if let Some(key) = as_str("api_key").or_else(|| as_str("value")).or_else(|| as_str("token")) {
        return Credential::ApiKey { key, expires_at };
    }

    if data.len() == 1 {
        if let Some(value) = data.values().next().and_then(|v| v.as_str()) {
            return Credential::ApiKey {
                key: value.to_string(),
                expires_at,
            };
        }
    }

    Credential::ApiKey {
        key: serde_json::Value::Object(data).to_string(),
        expires_at,
    }
}

#[derive(Debug, Deserialize)]
struct VaultLoginResponse {
    auth: VaultAuth,
}

#[derive(Debug, Deserialize)]
struct VaultAuth {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct VaultSecretResponse {
    data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    lease_duration: u32,
}

#[async_trait]
impl CredentialStrategy for VaultStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vault
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        let token = self.login().await?;
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let token = {
            let guard = self.token.read().await;
            guard.clone()
        };
        let token = match token {
            Some(token) => token,
            None => self.login().await?,
        };

        match self.read_secret(&token).await {
            Ok(cred) => Ok(cred),
            Err(_) => {
                // Token may have expired server-side; re-authenticate once.
                let token = self.login().await?;
                *self.token.write().await = Some(token.clone());
                self.read_secret(&token).await
            }
        }
    }
}
