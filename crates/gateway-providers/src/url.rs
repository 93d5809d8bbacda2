//! Upstream URL composition: region, endpoint, project, and deployment
//! substitution per provider.

use gateway_core::{GatewayError, Instance, ProviderKind, ProviderLocation};

/// The provider-native base URL an instance's requests are issued
/// against, before any path/query is appended.
///
/// # Errors
/// Returns [`GatewayError::Internal`] if the instance's `location` is
/// missing a field its provider kind requires (config validation should
/// have already caught this at load time; this is a defense-in-depth
/// check at dispatch time).
pub fn base_url(provider: ProviderKind, location: &ProviderLocation) -> Result<String, GatewayError> {
    match provider {
        ProviderKind::Bedrock => {
            if let Some(endpoint) = &location.endpoint {
                return Ok(endpoint.trim_end_matches('/').to_string());
            }
            let region = require(&location.region, provider, "region")?;
            Ok(format!("https://bedrock-runtime.{region}.amazonaws.com"))
        }
        ProviderKind::Azure => {
            let endpoint = require(&location.endpoint, provider, "endpoint")?;
            Ok(endpoint.trim_end_matches('/').to_string())
        }
        ProviderKind::Openai => Ok(location
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string())),
        ProviderKind::Anthropic => Ok(location
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string())),
        ProviderKind::Vertex => {
            let region = location.location.as_deref().unwrap_or("us-central1");
            Ok(format!("https://{region}-aiplatform.googleapis.com"))
        }
        ProviderKind::Ibm => {
            let endpoint = require(&location.endpoint, provider, "endpoint")?;
            Ok(endpoint.trim_end_matches('/').to_string())
        }
        ProviderKind::Oracle => {
            let endpoint = require(&location.endpoint, provider, "endpoint")?;
            Ok(endpoint.trim_end_matches('/').to_string())
        }
    }
}

/// Compose the full URL for a transparent-mode call: the provider's base
/// URL plus the caller's path suffix, verbatim.
///
/// # Errors
/// See [`base_url`].
pub fn transparent_url(instance: &Instance, suffix: &str) -> Result<String, GatewayError> {
    let base = base_url(instance.provider, &instance.location)?;
    let suffix = suffix.trim_start_matches('/');
    Ok(format!("{base}/{suffix}"))
}

/// Compose the full URL for a protocol-mode invocation of `model_id`,
/// substituting region/project/deployment as each provider's native API
/// requires.
///
/// # Errors
/// See [`base_url`]; additionally returns [`GatewayError::Internal`] if
/// an Azure instance has no deployment mapped for `model_id`.
pub fn protocol_invoke_url(instance: &Instance, model_id: &str, streaming: bool) -> Result<String, GatewayError> {
    let base = base_url(instance.provider, &instance.location)?;
    let location = &instance.location;

    match instance.provider {
        ProviderKind::Bedrock => {
            let action = if streaming { "converse-stream" } else { "converse" };
            Ok(format!("{base}/model/{model_id}/{action}"))
        }
        ProviderKind::Azure => {
            let deployment = location.deployments.get(model_id).ok_or_else(|| {
                GatewayError::Internal(format!(
                    "instance '{}': no deployment mapped for model '{model_id}'",
                    instance.name
                ))
            })?;
            let api_version = location.api_version.as_deref().unwrap_or("2024-02-01");
            Ok(format!(
                "{base}/openai/deployments/{deployment}/chat/completions?api-version={api_version}"
            ))
        }
        ProviderKind::Openai => Ok(format!("{base}/v1/chat/completions")),
        ProviderKind::Anthropic => Ok(format!("{base}/v1/messages")),
        ProviderKind::Vertex => {
            let project_id = require(&location.project_id, instance.provider, "project_id")?;
            let region = location.location.as_deref().unwrap_or("us-central1");
            let action = if streaming { "streamGenerateContent" } else { "generateContent" };
            Ok(format!(
                "{base}/v1/projects/{project_id}/locations/{region}/publishers/google/models/{model_id}:{action}"
            ))
        }
        ProviderKind::Ibm => {
            let project_id = require(&location.project_id, instance.provider, "project_id")?;
            Ok(format!(
                "{base}/ml/v1/text/generation?version=2024-01-01&project_id={project_id}"
            ))
        }
        ProviderKind::Oracle => {
            let action = if streaming { "chatStream" } else { "chat" };
            Ok(format!("{base}/20231130/actions/{action}"))
        }
    }
}

fn require<'a>(field: &'a Option<String>, provider: ProviderKind, name: &str) -> Result<&'a str, GatewayError> {
    field.as_deref().ok_or_else(|| {
        GatewayError::Internal(format!("provider '{provider}' requires location field '{name}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{Mode, PathBinding};
    use std::collections::HashMap;

    fn instance(provider: ProviderKind, location: ProviderLocation) -> Instance {
        Instance {
            name: "i".into(),
            provider,
            mode: Mode::Protocol,
            protocol: Some("openai".into()),
            translation: None,
            location,
            strategies: vec!["s".into()],
            endpoints: vec![PathBinding {
                path: "/x".into(),
                methods: vec!["POST".into()],
            }],
            metrics_labels: HashMap::new(),
        }
    }

    #[test]
    fn bedrock_url_embeds_region_and_model() {
        let i = instance(
            ProviderKind::Bedrock,
            ProviderLocation {
                region: Some("us-east-1".into()),
                ..Default::default()
            },
        );
        let url = protocol_invoke_url(&i, "claude-3-sonnet", false).unwrap();
        assert_eq!(
            url,
            "https://bedrock-runtime.us-east-1.amazonaws.com/model/claude-3-sonnet/converse"
        );
    }

    #[test]
    fn bedrock_streaming_uses_converse_stream_action() {
        let i = instance(
            ProviderKind::Bedrock,
            ProviderLocation {
                region: Some("us-east-1".into()),
                ..Default::default()
            },
        );
        let url = protocol_invoke_url(&i, "claude-3-sonnet", true).unwrap();
        assert!(url.ends_with("/converse-stream"));
    }

    #[test]
    fn azure_url_substitutes_deployment_and_api_version() {
        let i = instance(
            ProviderKind::Azure,
            ProviderLocation {
                endpoint: Some("https://my-resource.openai.azure.com/".into()),
                deployments: HashMap::from([("gpt-4".to_string(), "gpt-4-prod".to_string())]),
                api_version: Some("2024-06-01".into()),
                ..Default::default()
            },
        );
        let url = protocol_invoke_url(&i, "gpt-4", false).unwrap();
        assert_eq!(
            url,
            "https://my-resource.openai.azure.com/openai/deployments/gpt-4-prod/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn azure_unmapped_model_is_an_internal_error() {
        let i = instance(
            ProviderKind::Azure,
            ProviderLocation {
                endpoint: Some("https://x.openai.azure.com".into()),
                ..Default::default()
            },
        );
        assert!(protocol_invoke_url(&i, "unmapped", false).is_err());
    }

    #[test]
    fn vertex_url_embeds_project_and_location() {
        let i = instance(
            ProviderKind::Vertex,
            ProviderLocation {
                project_id: Some("my-proj".into()),
                location: Some("us-central1".into()),
                ..Default::default()
            },
        );
        let url = protocol_invoke_url(&i, "gemini-1.5-pro", false).unwrap();
        assert_eq!(
            url,
            "https://us-central1-aiplatform.googleapis.com/v1/projects/my-proj/locations/us-central1/publishers/google/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn transparent_url_joins_base_and_suffix() {
        let i = instance(
            ProviderKind::Openai,
            ProviderLocation::default(),
        );
        let url = transparent_url(&i, "/chat/completions").unwrap();
        assert_eq!(url, "https://api.openai.com/chat/completions");
    }

    #[test]
    fn bedrock_missing_region_is_an_internal_error() {
        let i = instance(ProviderKind::Bedrock, ProviderLocation::default());
        assert!(transparent_url(&i, "/model/x/converse").is_err());
    }
}
