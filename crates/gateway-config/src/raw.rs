//! The as-written shape of the text configuration document (spec.md §6
//! "Configuration file"), deserialized directly by `serde_yaml` after
//! environment-variable expansion.

use crate::strategy::StrategyConfig;
use gateway_core::{Dialect, Instance, Mode, PathBinding, ProviderKind, ProviderLocation, TranslationPair};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The whole document: `global`, `instances`, `routing`, `features`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// Process-wide defaults.
    #[serde(default)]
    pub global: GlobalConfig,
    /// Named instance definitions.
    #[serde(default)]
    pub instances: HashMap<String, RawInstance>,
    /// Default instance name per provider kind, for the legacy
    /// `/v1/chat/completions` routes.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Named boolean feature flags.
    #[serde(default)]
    pub features: HashMap<String, bool>,
}

/// Process-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Plaintext listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// TLS listen port, if TLS is configured.
    #[serde(default)]
    pub tls_port: Option<u16>,
    /// Non-streaming request timeout, seconds.
    #[serde(default = "default_non_streaming_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Per-frame streaming idle timeout, seconds.
    #[serde(default = "default_stream_idle_timeout_secs")]
    pub stream_idle_timeout_secs: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            tls_port: None,
            request_timeout_secs: default_non_streaming_timeout_secs(),
            stream_idle_timeout_secs: default_stream_idle_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_non_streaming_timeout_secs() -> u64 {
    120
}

fn default_stream_idle_timeout_secs() -> u64 {
    60
}

/// Default instance name per provider kind, consumed by the legacy
/// `/v1/chat/completions`, `/v1/models` routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Provider-kind tag (serialized the same way as `ProviderKind`) to
    /// instance name.
    #[serde(default, flatten)]
    pub defaults: HashMap<String, String>,
}

/// One `instances.<name>` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInstance {
    /// Upstream provider kind.
    #[serde(rename = "type")]
    pub provider: ProviderKind,
    /// Transparent or protocol mode.
    pub mode: Mode,
    /// Caller-facing protocol tag; protocol mode only.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Translation pair; protocol mode only.
    #[serde(default)]
    pub transformation: Option<RawTransformation>,
    /// AWS region (Bedrock).
    #[serde(default)]
    pub region: Option<String>,
    /// Base/endpoint URL override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// GCP/OCI project identifier.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Oracle compartment identifier.
    #[serde(default)]
    pub compartment_id: Option<String>,
    /// Azure/Vertex deployment location.
    #[serde(default)]
    pub location: Option<String>,
    /// Azure deployment-name map, keyed by canonical model id.
    #[serde(default)]
    pub deployments: HashMap<String, String>,
    /// Azure API version query parameter.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Authentication configuration.
    pub authentication: RawAuthentication,
    /// Path-prefix bindings.
    pub endpoints: Vec<RawEndpoint>,
    /// Metrics label overrides.
    #[serde(default)]
    pub metrics: RawMetrics,
}

/// `instances.<name>.transformation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransformation {
    /// Dialect the incoming canonical request is translated to.
    pub request_to: Dialect,
    /// Dialect the upstream response is translated from.
    pub response_from: Dialect,
}

/// `instances.<name>.authentication`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAuthentication {
    /// Ordered strategies to try.
    pub strategies: Vec<StrategyConfig>,
}

/// `instances.<name>.endpoints[]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEndpoint {
    /// The path prefix this instance owns.
    pub path: String,
    /// Allowed HTTP methods.
    pub methods: Vec<String>,
}

/// `instances.<name>.metrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetrics {
    /// Extra labels attached to this instance's telemetry.
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl RawInstance {
    /// Lower this document entry into the core, provider-agnostic
    /// [`Instance`] model the dispatcher resolves against. Strategy
    /// ordering and names are carried through; building the live
    /// `Arc<dyn CredentialStrategy>` values from `self.authentication.strategies`
    /// is the caller's job (`gateway-server`, which depends on
    /// `gateway-credentials`).
    #[must_use]
    pub fn into_instance(self, name: String) -> Instance {
        Instance {
            name,
            provider: self.provider,
            mode: self.mode,
            protocol: self.protocol,
            translation: self.transformation.map(|t| TranslationPair {
                request_to: t.request_to,
                response_from: t.response_from,
            }),
            location: ProviderLocation {
                region: self.region,
                endpoint: self.endpoint,
                project_id: self.project_id,
                compartment_id: self.compartment_id,
                location: self.location,
                deployments: self.deployments,
                api_version: self.api_version,
            },
            strategies: self
                .authentication
                .strategies
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            endpoints: self
                .endpoints
                .into_iter()
                .map(|e| PathBinding {
                    path: e.path,
                    methods: e.methods,
                })
                .collect(),
            metrics_labels: self.metrics.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let yaml = r#"
global:
  port: 9090
instances:
  bedrock_us1_openai:
    type: bedrock
    mode: protocol
    protocol: openai
    transformation:
      request_to: bedrock_converse
      response_from: bedrock_converse
    region: us-east-1
    authentication:
      strategies:
        - type: workload_identity_aws
          name: aws-irsa
          role_arn: arn:aws:iam::111:role/bedrock
          region: us-east-1
    endpoints:
      - path: /openai/bedrock_us1_openai
        methods: [POST]
routing:
  bedrock: bedrock_us1_openai
features:
  strict_validation: true
"#;
        let doc: RawConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.global.port, 9090);
        assert_eq!(doc.routing.defaults.get("bedrock").unwrap(), "bedrock_us1_openai");
        assert_eq!(doc.features.get("strict_validation"), Some(&true));

        let raw = doc.instances.get("bedrock_us1_openai").unwrap().clone();
        let instance = raw.into_instance("bedrock_us1_openai".to_string());
        assert_eq!(instance.strategies, vec!["aws-irsa".to_string()]);
        assert_eq!(instance.location.region.as_deref(), Some("us-east-1"));
        assert!(instance.validate().is_empty());
    }
}
