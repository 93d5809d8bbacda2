//! Declarative shape of one entry in an instance's
//! `authentication.strategies[]` list.
//!
//! This crate only carries the data; turning a [`StrategyConfig`] into a
//! live `Arc<dyn CredentialStrategy>` is wiring done where both
//! `gateway-config` and `gateway-credentials` are in scope (`gateway-server`
//! binds them at startup), keeping this crate free of the per-provider HTTP
//! strategy implementations.

use serde::{Deserialize, Serialize};

/// One configured credential-acquisition strategy, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// AWS IRSA-style web-identity federation.
    WorkloadIdentityAws {
        /// Stable name for logs/tainting.
        name: String,
        /// Role to assume.
        role_arn: String,
        /// Mounted web-identity token path.
        #[serde(default = "default_aws_token_file")]
        token_file: String,
        /// AWS region for the STS endpoint.
        region: String,
    },
    /// Azure federated-identity.
    WorkloadIdentityAzure {
        /// Stable name for logs/tainting.
        name: String,
        /// AAD tenant id.
        tenant_id: String,
        /// AAD application (client) id.
        client_id: String,
        /// Mounted federated-token path.
        federated_token_file: String,
        /// OAuth2 scope to request, e.g.
        /// `"https://cognitiveservices.azure.com/.default"`.
        scope: String,
    },
    /// GCP workload identity / Application Default Credentials.
    WorkloadIdentityGcp {
        /// Stable name for logs/tainting.
        name: String,
        /// Path to a service-account key file; omit to use the metadata
        /// server.
        #[serde(default)]
        credentials_file: Option<String>,
        /// OAuth2 scope to request.
        #[serde(default = "default_gcp_scope")]
        scope: String,
    },
    /// HashiCorp Vault via the Kubernetes auth method.
    Vault {
        /// Stable name for logs/tainting.
        name: String,
        /// Vault server address.
        vault_addr: String,
        /// Kubernetes-auth role bound to this instance's service account.
        role: String,
        /// Path to the secret this strategy reads after login.
        secret_path: String,
    },
    /// AWS Secrets Manager.
    AwsSecretsManager {
        /// Stable name for logs/tainting.
        name: String,
        /// AWS region.
        region: String,
        /// Secret id or ARN.
        secret_id: String,
        /// Static access key id used to sign the `GetSecretValue` call.
        access_key_id: String,
        /// Static secret access key used to sign the call.
        secret_access_key: String,
    },
    /// Azure Key Vault.
    AzureKeyVault {
        /// Stable name for logs/tainting.
        name: String,
        /// Vault base URL, e.g. `"https://my-vault.vault.azure.net"`.
        vault_url: String,
        /// Secret name within the vault.
        secret_name: String,
        /// Pre-acquired AAD bearer token scoped to Key Vault.
        bearer_token: String,
    },
    /// GCP Secret Manager.
    GcpSecretManager {
        /// Stable name for logs/tainting.
        name: String,
        /// GCP project id.
        project_id: String,
        /// Secret id within the project.
        secret_id: String,
        /// Pre-acquired OAuth2 bearer token scoped to Secret Manager.
        bearer_token: String,
    },
    /// A file mounted by a sidecar CSI driver, or a literal value.
    MountedSecret {
        /// Stable name for logs/tainting.
        name: String,
        /// Mounted file path; mutually exclusive with `value`.
        #[serde(default)]
        path: Option<String>,
        /// Literal value taken directly from configuration (after env
        /// expansion); mutually exclusive with `path`.
        #[serde(default)]
        value: Option<String>,
    },
}

impl StrategyConfig {
    /// The declared name, used to report configuration errors.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::WorkloadIdentityAws { name, .. }
            | Self::WorkloadIdentityAzure { name, .. }
            | Self::WorkloadIdentityGcp { name, .. }
            | Self::Vault { name, .. }
            | Self::AwsSecretsManager { name, .. }
            | Self::AzureKeyVault { name, .. }
            | Self::GcpSecretManager { name, .. }
            | Self::MountedSecret { name, .. } => name,
        }
    }

    /// Validate this entry's own shape, beyond what serde already enforces.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if let Self::MountedSecret { name, path, value } = self {
            if path.is_none() == value.is_none() {
                return vec![format!(
                    "strategy '{name}': mounted_secret requires exactly one of `path` or `value`"
                )];
            }
        }
        Vec::new()
    }
}

fn default_aws_token_file() -> String {
    "/var/run/secrets/eks.amazonaws.com/serviceaccount/token".to_string()
}

fn default_gcp_scope() -> String {
    "https://www.googleapis.com/auth/cloud-platform".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mounted_secret_requires_exactly_one_source() {
        let both = StrategyConfig::MountedSecret {
            name: "csi".into(),
            path: Some("/a".into()),
            value: Some("b".into()),
        };
        assert_eq!(both.validate().len(), 1);

        let neither = StrategyConfig::MountedSecret {
            name: "csi".into(),
            path: None,
            value: None,
        };
        assert_eq!(neither.validate().len(), 1);

        let exactly_one = StrategyConfig::MountedSecret {
            name: "csi".into(),
            path: Some("/a".into()),
            value: None,
        };
        assert!(exactly_one.validate().is_empty());
    }

    #[test]
    fn deserializes_tagged_workload_identity() {
        let yaml = r#"
type: workload_identity_aws
name: aws-irsa
role_arn: arn:aws:iam::111:role/bedrock
region: us-east-1
"#;
        let cfg: StrategyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.name(), "aws-irsa");
        assert!(matches!(cfg, StrategyConfig::WorkloadIdentityAws { .. }));
    }
}
