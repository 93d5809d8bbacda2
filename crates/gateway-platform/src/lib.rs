//! # Gateway Platform
//!
//! Single-call-at-startup detection of ambient workload-identity signals
//!. The result is advisory: credential
//! strategies in `gateway-credentials` still validate themselves at
//! acquisition time, so a false positive here only costs one failed
//! election, never a wrong credential.
//!
//! Detection reads environment variables and a handful of well-known
//! files; both are abstracted behind [`EnvSource`] so tests can inject a
//! fake environment instead of touching the real one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use gateway_core::PlatformCapabilities;
use std::path::Path;
use tracing::debug;

/// AWS IRSA-style federation: a service account token mounted by the
/// Kubernetes control plane, paired with the role to assume.
const AWS_WEB_IDENTITY_TOKEN_FILE: &str = "AWS_WEB_IDENTITY_TOKEN_FILE";
const AWS_ROLE_ARN: &str = "AWS_ROLE_ARN";

/// Azure workload-identity federation, set by the AKS admission webhook.
const AZURE_FEDERATED_TOKEN_FILE: &str = "AZURE_FEDERATED_TOKEN_FILE";
const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";

/// GCP application-default-credentials file, as set by Workload Identity
/// Federation or a mounted service-account key.
const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Marker file present on GCE/GKE nodes identifying the hypervisor; used
/// as a metadata-server stand-in so detection stays a pure filesystem
/// check rather than a network round trip.
const GCE_DMI_PRODUCT_NAME_FILE: &str = "/sys/class/dmi/id/product_name";

/// OCI resource-principal environment, set inside Functions and
/// instance-principal-enabled compute.
const OCI_RESOURCE_PRINCIPAL_VERSION: &str = "OCI_RESOURCE_PRINCIPAL_VERSION";
const OCI_RESOURCE_PRINCIPAL_RPST: &str = "OCI_RESOURCE_PRINCIPAL_RPST";

/// IBM Cloud compute-resource token, mounted into Code Engine / IKS pods
/// bound to a trusted profile.
const IBM_CR_TOKEN_FILE: &str = "CR_TOKEN_FILE";

/// Indirection over environment variables and file presence so detection
/// can be tested without touching the real process environment.
pub trait EnvSource {
    /// Read an environment variable, if set.
    fn var(&self, key: &str) -> Option<String>;
    /// Whether a path exists and is readable.
    fn file_exists(&self, path: &str) -> bool;
    /// Read a file's contents as a string, if it exists and is valid UTF-8.
    fn read_to_string(&self, path: &str) -> Option<String>;
}

/// Reads the real process environment and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn file_exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn read_to_string(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// Detects ambient workload-identity signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformDetector;

impl PlatformDetector {
    /// Detect capabilities from the real process environment.
    #[must_use]
    pub fn detect() -> PlatformCapabilities {
        Self::detect_with(&ProcessEnv)
    }

    /// Detect capabilities from an arbitrary [`EnvSource`]. Exposed for
    /// tests and for the `validate`/`config show` CLI commands, which run
    /// the same detection the server would use at startup.
    #[must_use]
    pub fn detect_with(env: &impl EnvSource) -> PlatformCapabilities {
        let caps = PlatformCapabilities {
            aws_web_identity: has_aws_web_identity(env),
            azure_federated_identity: has_azure_federated_identity(env),
            gcp_workload_identity: has_gcp_workload_identity(env),
            oci_resource_principal: has_oci_resource_principal(env),
            ibm_compute_resource: has_ibm_compute_resource(env),
        };

        debug!(?caps, "platform detection complete");
        caps
    }
}

fn has_aws_web_identity(env: &impl EnvSource) -> bool {
    let Some(token_file) = env.var(AWS_WEB_IDENTITY_TOKEN_FILE) else {
        return false;
    };
    env.var(AWS_ROLE_ARN).is_some() && env.file_exists(&token_file)
}

fn has_azure_federated_identity(env: &impl EnvSource) -> bool {
    let Some(token_file) = env.var(AZURE_FEDERATED_TOKEN_FILE) else {
        return false;
    };
    env.var(AZURE_TENANT_ID).is_some()
        && env.var(AZURE_CLIENT_ID).is_some()
        && env.file_exists(&token_file)
}

fn has_gcp_workload_identity(env: &impl EnvSource) -> bool {
    if let Some(creds_file) = env.var(GOOGLE_APPLICATION_CREDENTIALS) {
        if env.file_exists(&creds_file) {
            return true;
        }
    }

    env.read_to_string(GCE_DMI_PRODUCT_NAME_FILE)
        .is_some_and(|product| product.trim() == "Google" || product.trim() == "Google Compute Engine")
}

fn has_oci_resource_principal(env: &impl EnvSource) -> bool {
    env.var(OCI_RESOURCE_PRINCIPAL_VERSION).is_some()
        && env.var(OCI_RESOURCE_PRINCIPAL_RPST).is_some()
}

fn has_ibm_compute_resource(env: &impl EnvSource) -> bool {
    env.var(IBM_CR_TOKEN_FILE)
        .is_some_and(|path| env.file_exists(&path))
}
