//! Turns an instance's declared [`StrategyConfig`] list into a live,
//! elected [`CredentialManager`]. This is the one
//! place in the workspace that depends on both `gateway-config` and
//! `gateway-credentials`.

use gateway_config::StrategyConfig;
use gateway_core::{GatewayError, PlatformCapabilities};
use gateway_credentials::{
    AwsSecretsManagerStrategy, AwsWorkloadIdentityStrategy, AzureKeyVaultStrategy,
    AzureWorkloadIdentityStrategy, CredentialManager, CredentialStrategy, GcpSecretManagerStrategy,
    GcpWorkloadIdentityStrategy, MountedSecretStrategy, VaultStrategy,
};
use std::sync::Arc;

/// Build one [`Arc<dyn CredentialStrategy>`] per declared entry, in
/// declaration order, then construct and elect the manager.
///
/// # Errors
/// Returns [`GatewayError::ServiceUnavailable`] if every strategy fails
/// `init`/first `get`.
pub async fn build_credential_manager(
    instance_name: &str,
    strategies: &[StrategyConfig],
    caps: &PlatformCapabilities,
) -> Result<Arc<CredentialManager>, GatewayError> {
    let live: Vec<Arc<dyn CredentialStrategy>> = strategies.iter().map(|s| build_strategy(s, caps)).collect();
    let manager = Arc::new(CredentialManager::new(instance_name, live));
    manager.init().await?;
    Ok(manager)
}

fn build_strategy(config: &StrategyConfig, caps: &PlatformCapabilities) -> Arc<dyn CredentialStrategy> {
    match config {
        StrategyConfig::WorkloadIdentityAws {
            name,
            role_arn,
            token_file,
            region,
        } => Arc::new(AwsWorkloadIdentityStrategy::new(name, role_arn, token_file, region, caps)),

        StrategyConfig::WorkloadIdentityAzure {
            name,
            tenant_id,
            client_id,
            federated_token_file,
            scope,
        } => Arc::new(AzureWorkloadIdentityStrategy::new(
            name,
            tenant_id,
            client_id,
            federated_token_file,
            scope,
            caps,
        )),

        StrategyConfig::WorkloadIdentityGcp {
            name,
            credentials_file,
            scope,
        } => Arc::new(GcpWorkloadIdentityStrategy::new(
            name,
            credentials_file.clone(),
            scope,
            caps,
        )),

        StrategyConfig::Vault {
            name,
            vault_addr,
            role,
            secret_path,
        } => Arc::new(VaultStrategy::new(name, vault_addr, role, secret_path)),

        StrategyConfig::AwsSecretsManager {
            name,
            region,
            secret_id,
            access_key_id,
            secret_access_key,
        } => Arc::new(AwsSecretsManagerStrategy::new(
            name,
            region,
            secret_id,
            access_key_id,
            secret_access_key,
        )),

        StrategyConfig::AzureKeyVault {
            name,
            vault_url,
            secret_name,
            bearer_token,
        } => Arc::new(AzureKeyVaultStrategy::new(name, vault_url, secret_name, bearer_token)),

        StrategyConfig::GcpSecretManager {
            name,
            project_id,
            secret_id,
            bearer_token,
        } => Arc::new(GcpSecretManagerStrategy::new(name, project_id, secret_id, bearer_token)),

        StrategyConfig::MountedSecret { name, path, value } => match (path, value) {
            (Some(path), _) => Arc::new(MountedSecretStrategy::from_file(name, path)),
            (None, Some(value)) => Arc::new(MountedSecretStrategy::from_literal(name, value)),
            (None, None) => Arc::new(MountedSecretStrategy::from_literal(name, "")),
        },
    }
}
