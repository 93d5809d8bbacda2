//! Shared, request-independent state the dispatcher reads on every call.

use gateway_config::InstanceRegistry;
use gateway_credentials::CredentialManager;
use gateway_providers::ProviderClient;
use gateway_telemetry::Metrics;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything [`crate::dispatch`] needs, built once at startup and shared
/// read-only across every request.
#[derive(Clone)]
pub struct AppState {
    /// The parsed, validated instance set.
    pub registry: Arc<InstanceRegistry>,
    /// One credential manager per instance, keyed by instance name.
    pub credentials: Arc<HashMap<String, Arc<CredentialManager>>>,
    /// The shared retrying HTTP client every provider call goes through.
    pub provider_client: Arc<ProviderClient>,
    /// Prometheus counters.
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Build application state from an already-loaded registry and
    /// already-elected credential managers.
    #[must_use]
    pub fn new(
        registry: Arc<InstanceRegistry>,
        credentials: HashMap<String, Arc<CredentialManager>>,
        provider_client: Arc<ProviderClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            credentials: Arc::new(credentials),
            provider_client,
            metrics,
        }
    }

    /// The credential manager for a named instance, if one was wired.
    ///
    /// # Errors
    /// Returns [`gateway_core::GatewayError::Internal`] if no manager was
    /// built for this instance at startup — a wiring bug, since every
    /// instance in the registry gets one.
    pub fn credential_manager(&self, instance_name: &str) -> Result<&Arc<CredentialManager>, gateway_core::GatewayError> {
        self.credentials.get(instance_name).ok_or_else(|| {
            gateway_core::GatewayError::Internal(format!(
                "no credential manager wired for instance '{instance_name}'"
            ))
        })
    }
}
