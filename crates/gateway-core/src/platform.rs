//! The platform capability set: a fixed-shape record of booleans, one per
//! workload-identity family, computed once at startup.
//!
//! Detection itself lives in the `gateway-platform` crate, which produces
//! values of this type by inspecting ambient environment/filesystem
//! signals; this crate only owns the shape, since it is part of the
//! canonical model every other crate depends on.

use serde::{Deserialize, Serialize};

/// Advisory record of which workload-identity families look available.
/// Cross-cloud federation is possible — multiple flags may be true at
/// once. Credential strategies still validate themselves at acquisition
/// time; this is a hint, not a guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// AWS web-identity token file and role ARN are both present
    /// (IRSA-style federation).
    pub aws_web_identity: bool,
    /// Azure federated-token file plus tenant and client IDs are present.
    pub azure_federated_identity: bool,
    /// GCP application-default-credentials file is present, or the
    /// metadata server answered.
    pub gcp_workload_identity: bool,
    /// OCI resource-principal environment markers are present.
    pub oci_resource_principal: bool,
    /// IBM compute-resource token marker is present.
    pub ibm_compute_resource: bool,
}

impl PlatformCapabilities {
    /// A capability set with every flag false, as if no ambient
    /// workload-identity signal were detected.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether any workload-identity family was detected at all.
    #[must_use]
    pub fn any(&self) -> bool {
        self.aws_web_identity
            || self.azure_federated_identity
            || self.gcp_workload_identity
            || self.oci_resource_principal
            || self.ibm_compute_resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_has_every_flag_false() {
        assert!(!PlatformCapabilities::none().any());
    }

    #[test]
    fn any_detects_a_single_set_flag() {
        let caps = PlatformCapabilities {
            gcp_workload_identity: true,
            ..Default::default()
        };
        assert!(caps.any());
    }

    #[test]
    fn cross_cloud_federation_is_representable() {
        let caps = PlatformCapabilities {
            aws_web_identity: true,
            azure_federated_identity: true,
            ..Default::default()
        };
        assert!(caps.aws_web_identity && caps.azure_federated_identity);
    }
}
