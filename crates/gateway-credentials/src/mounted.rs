//! Mounted secret / static strategy.

use crate::strategy::{CredentialStrategy, StrategyKind};
use async_trait::async_trait;
use gateway_core::{Credential, GatewayError};

/// Where a [`MountedSecretStrategy`] reads its value from.
#[derive(Debug, Clone)]
pub enum MountedSource {
    /// A file path, as injected by a sidecar CSI driver.
    File(String),
    /// A literal value taken directly from configuration.
    Literal(String),
}

/// Reads a file path or a literal configured value. Never expires.
pub struct MountedSecretStrategy {
    name: String,
    source: MountedSource,
}

impl MountedSecretStrategy {
    /// Build a strategy reading from a mounted file.
    #[must_use]
    pub fn from_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: MountedSource::File(path.into()),
        }
    }

    /// Build a strategy wrapping a literal value.
    #[must_use]
    pub fn from_literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: MountedSource::Literal(value.into()),
        }
    }
}

#[async_trait]
impl CredentialStrategy for MountedSecretStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MountedSecret
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&self) -> Result<(), GatewayError> {
        if let MountedSource::File(path) = &self.source {
            tokio::fs::metadata(path).await.map_err(|e| {
                GatewayError::service_unavailable(format!("{}: mount not present ({e})", self.name))
            })?;
        }
        Ok(())
    }

    async fn get(&self) -> Result<Credential, GatewayError> {
        let key = match &self.source {
            MountedSource::Literal(value) => value.clone(),
            MountedSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                GatewayError::service_unavailable(format!("{}: read failed ({e})", self.name))
            })?,
        };
        Ok(Credential::ApiKey {
            key: key.trim().to_string(),
            expires_at: None,
        })
    }
}
