//! The common strategy contract.

use async_trait::async_trait;
use gateway_core::{Credential, GatewayError};

/// Which of the six strategy families a [`CredentialStrategy`] implements.
/// Carried in metrics labels and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Exchange a mounted workload-identity token for a short-lived
    /// cloud-native credential (AWS STS, Azure AAD, GCP ADC).
    WorkloadIdentity,
    /// HashiCorp Vault, authenticated via the Kubernetes auth method.
    Vault,
    /// AWS Secrets Manager.
    AwsSecretsManager,
    /// Azure Key Vault.
    AzureKeyVault,
    /// GCP Secret Manager.
    GcpSecretManager,
    /// A file mounted by a sidecar CSI driver, or a literal configured
    /// value.
    MountedSecret,
}

impl StrategyKind {
    /// Short tag used in metrics labels and tracing fields.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::WorkloadIdentity => "workload_identity",
            Self::Vault => "vault",
            Self::AwsSecretsManager => "aws_secrets_manager",
            Self::AzureKeyVault => "azure_key_vault",
            Self::GcpSecretManager => "gcp_secret_manager",
            Self::MountedSecret => "mounted_secret",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A capability that yields a time-bounded [`Credential`] of one shape
///. Implementations probe reachability in `init` and
/// are dropped from election if that probe fails.
#[async_trait]
pub trait CredentialStrategy: Send + Sync {
    /// Which strategy family this is.
    fn kind(&self) -> StrategyKind;

    /// A stable name distinguishing this strategy instance from others of
    /// the same kind (e.g. a Vault path), used in logs and tainting.
    fn name(&self) -> &str;

    /// Probe reachability and perform any one-time setup. A failure here
    /// makes the strategy ineligible for election.
    async fn init(&self) -> Result<(), GatewayError>;

    /// Acquire a fresh credential. Called both for the first acquisition
    /// and for every subsequent refresh; strategies with no natural
    /// "refresh vs. initial fetch" distinction (mounted secrets, static
    /// values) simply re-read the same source.
    async fn get(&self) -> Result<Credential, GatewayError>;
}
