//! Turns configuration text into a validated [`InstanceRegistry`].

use crate::env::{EnvSource, ProcessEnv};
use crate::error::ConfigError;
use crate::raw::RawConfig;
use crate::registry::{validate_prefix_uniqueness, InstanceRegistry};
use gateway_core::ProviderKind;
use std::collections::HashMap;
use std::path::Path;

/// Load and validate configuration from a file on disk, expanding
/// `${NAME}` references against the real process environment.
pub async fn load_config(path: impl AsRef<Path>) -> Result<InstanceRegistry, ConfigError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
    load_from_str(&text, &ProcessEnv)
}

/// Load and validate configuration already read into memory, against a
/// caller-supplied environment source. Exposed for tests and for the
/// `--validate` CLI flag, which needs to report errors without requiring
/// the full process environment to be correct.
pub fn load_from_str(text: &str, env: &dyn EnvSource) -> Result<InstanceRegistry, ConfigError> {
    let expanded = crate::env::expand(text, env).map_err(ConfigError::UnresolvedEnv)?;
    let doc: RawConfig = serde_yaml::from_str(&expanded)?;
    build_registry(doc)
}

/// Convert an already-parsed document into a registry, running every
/// validation and collecting all violations before failing.
pub fn build_registry(doc: RawConfig) -> Result<InstanceRegistry, ConfigError> {
    let mut errors = Vec::new();

    let mut instances = HashMap::with_capacity(doc.instances.len());
    let mut strategy_configs = HashMap::with_capacity(doc.instances.len());
    for (name, raw) in doc.instances {
        for strategy in &raw.authentication.strategies {
            errors.extend(strategy.validate());
        }
        let strategies = raw.authentication.strategies.clone();
        let instance = raw.into_instance(name.clone());
        errors.extend(instance.validate());
        strategy_configs.insert(name.clone(), strategies);
        instances.insert(name, instance);
    }

    errors.extend(validate_prefix_uniqueness(&instances));

    let mut routing_defaults = HashMap::with_capacity(doc.routing.defaults.len());
    for (kind, instance_name) in &doc.routing.defaults {
        match parse_provider_kind(kind) {
            Some(parsed) => {
                if !instances.contains_key(instance_name) {
                    errors.push(format!(
                        "routing default for '{kind}' names unknown instance '{instance_name}'"
                    ));
                }
                routing_defaults.insert(parsed, instance_name.clone());
            }
            None => errors.push(format!("routing: unknown provider kind '{kind}'")),
        }
    }

    if instances.is_empty() {
        errors.push("configuration declares no instances".to_string());
    }

    if !errors.is_empty() {
        errors.sort();
        return Err(ConfigError::Invalid(errors));
    }

    Ok(InstanceRegistry::new(
        instances,
        routing_defaults,
        doc.features,
        strategy_configs,
        doc.global,
    ))
}

fn parse_provider_kind(tag: &str) -> Option<ProviderKind> {
    serde_json::from_value(serde_json::Value::String(tag.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;

    struct FakeEnv(StdHashMap<&'static str, &'static str>);

    impl EnvSource for FakeEnv {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|v| (*v).to_string())
        }
    }

    fn valid_yaml() -> &'static str {
        r#"
instances:
  bedrock_us1_openai:
    type: bedrock
    mode: protocol
    protocol: openai
    transformation:
      request_to: bedrock_converse
      response_from: bedrock_converse
    region: ${AWS_REGION}
    authentication:
      strategies:
        - type: workload_identity_aws
          name: aws-irsa
          role_arn: arn:aws:iam::111:role/bedrock
          region: ${AWS_REGION}
    endpoints:
      - path: /openai/bedrock_us1_openai
        methods: [POST]
routing:
  bedrock: bedrock_us1_openai
"#
    }

    #[test]
    fn loads_a_valid_document() {
        let env = FakeEnv(StdHashMap::from([("AWS_REGION", "us-east-1")]));
        let registry = load_from_str(valid_yaml(), &env).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry
            .default_for_provider(ProviderKind::Bedrock)
            .is_some());
    }

    #[test]
    fn missing_env_var_fails_before_parsing() {
        let env = FakeEnv(StdHashMap::new());
        let err = load_from_str(valid_yaml(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedEnv(names) if names.contains(&"AWS_REGION".to_string())));
    }

    #[test]
    fn invalid_instance_is_reported_alongside_other_errors() {
        let yaml = r#"
instances:
  broken:
    type: bedrock
    mode: protocol
    authentication:
      strategies: []
    endpoints: []
routing:
  bedrock: does_not_exist
"#;
        let env = FakeEnv(StdHashMap::new());
        let err = load_from_str(yaml, &env).unwrap_err();
        match err {
            ConfigError::Invalid(errors) => {
                assert!(errors.iter().any(|e| e.contains("translation pair")));
                assert!(errors.iter().any(|e| e.contains("non-empty")));
                assert!(errors.iter().any(|e| e.contains("at least one endpoint")));
                assert!(errors.iter().any(|e| e.contains("unknown instance")));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }
}
