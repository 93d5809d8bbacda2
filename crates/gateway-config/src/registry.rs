//! The resolved, queryable set of instances the dispatcher consults on
//! every request.

use crate::raw::GlobalConfig;
use crate::strategy::StrategyConfig;
use gateway_core::{Instance, Mode, ProviderKind};
use std::collections::HashMap;

/// An immutable, validated collection of instances, indexed for the two
/// lookups the dispatcher needs: by name, and by longest-matching path
/// prefix.
#[derive(Debug, Clone)]
pub struct InstanceRegistry {
    instances: HashMap<String, Instance>,
    /// Default instance name per provider kind, for the legacy
    /// `/v1/chat/completions` routes.
    routing_defaults: HashMap<ProviderKind, String>,
    features: HashMap<String, bool>,
    /// Ordered, fully-populated strategy definitions per instance name —
    /// `Instance::strategies` only keeps the names, since `gateway-core`
    /// doesn't depend on `gateway-credentials`; this is what
    /// `gateway-server` reads to build the live credential chain.
    strategy_configs: HashMap<String, Vec<StrategyConfig>>,
    /// Process-wide defaults.
    global: GlobalConfig,
}

impl InstanceRegistry {
    /// Build a registry from already-validated instances. Callers outside
    /// this crate should go through [`crate::loader::load_config`] instead,
    /// which runs validation first.
    #[must_use]
    pub fn new(
        instances: HashMap<String, Instance>,
        routing_defaults: HashMap<ProviderKind, String>,
        features: HashMap<String, bool>,
        strategy_configs: HashMap<String, Vec<StrategyConfig>>,
        global: GlobalConfig,
    ) -> Self {
        Self {
            instances,
            routing_defaults,
            features,
            strategy_configs,
            global,
        }
    }

    /// The ordered strategy definitions configured for a named instance, in
    /// declaration order — election tries them in this order. Empty if the
    /// instance doesn't exist.
    #[must_use]
    pub fn strategies_for(&self, instance_name: &str) -> &[StrategyConfig] {
        self.strategy_configs
            .get(instance_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Process-wide defaults (listen ports, timeouts).
    #[must_use]
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    /// Find the instance, and matched prefix, owning the longest path
    /// prefix of `request_path` among all declared endpoint bindings. Ties
    /// (equal-length prefixes on two instances) cannot occur in a
    /// validated registry; see [`validate_prefix_uniqueness`].
    #[must_use]
    pub fn lookup_by_path(&self, request_path: &str) -> Option<(&Instance, &str)> {
        self.instances
            .values()
            .flat_map(|instance| {
                instance
                    .endpoints
                    .iter()
                    .filter(|binding| request_path.starts_with(binding.path.as_str()))
                    .map(move |binding| (instance, binding.path.as_str()))
            })
            .max_by_key(|(_, path)| path.len())
    }

    /// Find an instance by its stable name.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    /// The default instance for a provider kind, used by the legacy
    /// `/v1/chat/completions` and `/v1/models` routes.
    #[must_use]
    pub fn default_for_provider(&self, provider: ProviderKind) -> Option<&Instance> {
        self.routing_defaults
            .get(&provider)
            .and_then(|name| self.instances.get(name))
    }

    /// All instances, in declaration order is not preserved (backed by a
    /// map); callers that need a stable order should sort by name.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }

    /// Instances matching a mode, e.g. every `Mode::Transparent` instance.
    pub fn by_mode(&self, mode: Mode) -> impl Iterator<Item = &Instance> {
        self.instances.values().filter(move |i| i.mode == mode)
    }

    /// Instances matching a provider kind.
    pub fn by_provider(&self, provider: ProviderKind) -> impl Iterator<Item = &Instance> {
        self.instances.values().filter(move |i| i.provider == provider)
    }

    /// Whether a named boolean feature flag is set; absent flags default
    /// to `false`.
    #[must_use]
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// Number of instances in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the registry holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Check the cross-instance path invariants a single instance's own
/// `validate()` cannot see: disambiguating same-provider transparent
/// instances.
///
/// Two rules:
/// 1. No two instances may declare the exact same endpoint path.
/// 2. When more than one `Mode::Transparent` instance shares a provider
///    kind, each of their paths must carry a disambiguating segment
///    beyond `/transparent/{provider_kind}` (otherwise a bare
///    `/transparent/{provider_kind}/...` request could not tell them
///    apart), and those paths must be unique among themselves.
#[must_use]
pub fn validate_prefix_uniqueness(instances: &HashMap<String, Instance>) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen_paths: HashMap<&str, &str> = HashMap::new();
    for instance in instances.values() {
        for binding in &instance.endpoints {
            if let Some(other) = seen_paths.insert(binding.path.as_str(), instance.name.as_str()) {
                if other != instance.name {
                    errors.push(format!(
                        "instances '{other}' and '{}' both declare endpoint path '{}'",
                        instance.name, binding.path
                    ));
                }
            }
        }
    }

    let mut by_provider: HashMap<ProviderKind, Vec<&Instance>> = HashMap::new();
    for instance in instances.values() {
        if instance.mode == Mode::Transparent {
            by_provider.entry(instance.provider).or_default().push(instance);
        }
    }

    for (provider, group) in by_provider {
        if group.len() < 2 {
            continue;
        }
        let bare_prefix = format!("/transparent/{provider}");
        let disambiguated_prefix = format!("{bare_prefix}/");
        for instance in group {
            let disambiguated = instance
                .endpoints
                .iter()
                .all(|binding| binding.path.starts_with(&disambiguated_prefix));
            if !disambiguated {
                errors.push(format!(
                    "instance '{}': multiple transparent instances share provider '{provider}'; each endpoint path must extend '{bare_prefix}' with a disambiguating segment",
                    instance.name
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{Mode, PathBinding};

    fn instance(name: &str, provider: ProviderKind, path: &str) -> Instance {
        Instance {
            name: name.to_string(),
            provider,
            mode: Mode::Transparent,
            protocol: None,
            translation: None,
            location: Default::default(),
            strategies: vec!["s".into()],
            endpoints: vec![PathBinding {
                path: path.to_string(),
                methods: vec!["POST".into()],
            }],
            metrics_labels: Default::default(),
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let mut map = HashMap::new();
        map.insert(
            "a".to_string(),
            instance("a", ProviderKind::Openai, "/transparent/openai"),
        );
        map.insert(
            "b".to_string(),
            instance("b", ProviderKind::Openai, "/transparent/openai/org2"),
        );
        let registry = InstanceRegistry::new(map, HashMap::new(), HashMap::new(), HashMap::new(), GlobalConfig::default());

        let (matched, prefix) = registry.lookup_by_path("/transparent/openai/org2/v1/chat").unwrap();
        assert_eq!(matched.name, "b");
        assert_eq!(prefix, "/transparent/openai/org2");
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let mut map = HashMap::new();
        map.insert(
            "a".to_string(),
            instance("a", ProviderKind::Openai, "/transparent/openai"),
        );
        map.insert(
            "b".to_string(),
            instance("b", ProviderKind::Anthropic, "/transparent/openai"),
        );
        let errors = validate_prefix_uniqueness(&map);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn same_provider_transparent_instances_require_disambiguator() {
        let mut map = HashMap::new();
        map.insert(
            "a".to_string(),
            instance("a", ProviderKind::Openai, "/transparent/openai"),
        );
        map.insert(
            "b".to_string(),
            instance("b", ProviderKind::Openai, "/transparent/openai2"),
        );
        let errors = validate_prefix_uniqueness(&map);
        assert!(errors.iter().any(|e| e.contains("disambiguating segment")));
    }

    #[test]
    fn disambiguated_same_provider_instances_pass() {
        let mut map = HashMap::new();
        map.insert(
            "a".to_string(),
            instance("a", ProviderKind::Openai, "/transparent/openai/org1"),
        );
        map.insert(
            "b".to_string(),
            instance("b", ProviderKind::Openai, "/transparent/openai/org2"),
        );
        let errors = validate_prefix_uniqueness(&map);
        assert!(errors.is_empty());
    }
}
