//! The instance: the unit of configuration the dispatcher resolves every
//! request against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The provider kind an instance talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// AWS Bedrock.
    Bedrock,
    /// Azure OpenAI.
    Azure,
    /// OpenAI.
    Openai,
    /// Anthropic.
    Anthropic,
    /// Google Vertex AI.
    Vertex,
    /// IBM watsonx.
    Ibm,
    /// Oracle Generative AI.
    Oracle,
}

impl ProviderKind {
    /// The `/transparent/{provider_kind}` path segment for this provider.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Azure => "azure",
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Vertex => "vertex",
            Self::Ibm => "ibm",
            Self::Oracle => "oracle",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Whether an instance forwards bytes untouched or translates dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Byte-preserving passthrough with outbound signing.
    Transparent,
    /// Bidirectional dialect translation via the canonical shape.
    Protocol,
}

/// A (request, response) translation pair naming the provider dialect on
/// each side. The caller-facing side is always the canonical OpenAI shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    /// Dialect the incoming canonical request is translated to.
    pub request_to: Dialect,
    /// Dialect the upstream response is translated from.
    pub response_from: Dialect,
}

/// A provider-native wire dialect a translator knows how to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// The canonical OpenAI chat-completions shape itself (identity pair).
    Openai,
    /// AWS Bedrock's Converse API.
    BedrockConverse,
    /// Anthropic's Messages API.
    AnthropicMessages,
    /// Google Vertex AI's Gemini `generateContent` shape.
    VertexGemini,
    /// Azure OpenAI (same shape as OpenAI, different transport).
    AzureOpenai,
    /// IBM watsonx / Oracle Generative AI's generation shape.
    OracleIbmGeneration,
}

/// Where to find an instance's upstream: whichever fields its provider
/// kind needs. Unused fields for a given provider are simply `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderLocation {
    /// AWS region (Bedrock).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Base/endpoint URL override (Azure, Oracle, self-hosted-compatible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// GCP/OCI project identifier (Vertex, Oracle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Oracle compartment identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    /// Azure/Vertex deployment location (e.g. `"eastus"`, `"us-central1"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Azure deployment-name map, keyed by canonical model id.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub deployments: HashMap<String, String>,
    /// Azure API version query parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// One path-prefix binding with its allowed HTTP methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathBinding {
    /// The prefix, e.g. `"/openai/bedrock_us1_openai"`.
    pub path: String,
    /// Allowed HTTP methods, upper-case.
    pub methods: Vec<String>,
}

impl PathBinding {
    /// Whether `method` is permitted on this binding.
    #[must_use]
    pub fn allows_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// A fully validated, immutable instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Stable name, unique within the registry.
    pub name: String,
    /// Upstream provider kind.
    pub provider: ProviderKind,
    /// Transparent or protocol mode.
    pub mode: Mode,
    /// Caller-facing protocol tag; `protocol` mode only. Currently always
    /// `"openai"` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Translation pair; required in `protocol` mode, forbidden otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationPair>,
    /// Where the upstream lives.
    #[serde(default)]
    pub location: ProviderLocation,
    /// Ordered credential-strategy names to try (see `gateway-credentials`).
    pub strategies: Vec<String>,
    /// Path-prefix bindings this instance owns.
    pub endpoints: Vec<PathBinding>,
    /// Metric labels attached to this instance's telemetry.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metrics_labels: HashMap<String, String>,
}

impl Instance {
    /// Enforce the §3 per-instance invariants, collecting every violation
    /// rather than stopping at the first.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.mode {
            Mode::Protocol => {
                if self.translation.is_none() {
                    errors.push(format!(
                        "instance '{}': protocol mode requires a translation pair",
                        self.name
                    ));
                }
            }
            Mode::Transparent => {
                if self.translation.is_some() {
                    errors.push(format!(
                        "instance '{}': transparent mode forbids a translation pair",
                        self.name
                    ));
                }
            }
        }

        if self.strategies.is_empty() {
            errors.push(format!(
                "instance '{}': strategy list must be non-empty",
                self.name
            ));
        }

        if self.endpoints.is_empty() {
            errors.push(format!(
                "instance '{}': must declare at least one endpoint",
                self.name
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_instance() -> Instance {
        Instance {
            name: "bedrock_us1_openai".into(),
            provider: ProviderKind::Bedrock,
            mode: Mode::Protocol,
            protocol: Some("openai".into()),
            translation: Some(TranslationPair {
                request_to: Dialect::BedrockConverse,
                response_from: Dialect::BedrockConverse,
            }),
            location: ProviderLocation {
                region: Some("us-east-1".into()),
                ..Default::default()
            },
            strategies: vec!["workload_identity".into()],
            endpoints: vec![PathBinding {
                path: "/openai/bedrock_us1_openai".into(),
                methods: vec!["POST".into()],
            }],
            metrics_labels: HashMap::new(),
        }
    }

    #[test]
    fn protocol_mode_requires_translation() {
        let mut instance = base_instance();
        instance.translation = None;
        let errors = instance.validate();
        assert!(errors.iter().any(|e| e.contains("requires a translation")));
    }

    #[test]
    fn transparent_mode_forbids_translation() {
        let mut instance = base_instance();
        instance.mode = Mode::Transparent;
        let errors = instance.validate();
        assert!(errors.iter().any(|e| e.contains("forbids a translation")));
    }

    #[test]
    fn empty_strategy_list_is_rejected() {
        let mut instance = base_instance();
        instance.strategies.clear();
        let errors = instance.validate();
        assert!(errors.iter().any(|e| e.contains("non-empty")));
    }

    #[test]
    fn valid_instance_has_no_errors() {
        assert!(base_instance().validate().is_empty());
    }

    #[test]
    fn path_binding_method_match_is_case_insensitive() {
        let binding = PathBinding {
            path: "/x".into(),
            methods: vec!["POST".into()],
        };
        assert!(binding.allows_method("post"));
        assert!(!binding.allows_method("GET"));
    }
}
