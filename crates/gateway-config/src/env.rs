//! `${NAME}` / `${NAME:-default}` environment-variable expansion, run over
//! the raw configuration text before it is parsed (spec.md §4.1
//! "Parsing").

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}").expect("valid regex")
});

/// A source of environment variables, abstracted so tests can supply a
/// fake environment instead of mutating the real process one.
pub trait EnvSource {
    /// Read a variable by name.
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads from the real process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Expand every `${NAME}` / `${NAME:-default}` reference in `text`.
///
/// # Errors
/// Returns the names of every `${NAME}` reference (without a `:-default`
/// fallback) that remains unresolved after substitution (spec.md §4.1
/// "unresolved references after expansion cause startup failure").
pub fn expand(text: &str, env: &dyn EnvSource) -> Result<String, Vec<String>> {
    let mut unresolved: HashSet<String> = HashSet::new();

    let expanded = PLACEHOLDER.replace_all(text, |caps: &regex::Captures| {
        let name = &caps[1];
        let default = caps.get(3).map(|m| m.as_str());

        match env.get(name) {
            Some(value) => value,
            None => match default {
                Some(default) => default.to_string(),
                None => {
                    unresolved.insert(name.to_string());
                    String::new()
                }
            },
        }
    });

    if unresolved.is_empty() {
        Ok(expanded.into_owned())
    } else {
        let mut names: Vec<String> = unresolved.into_iter().collect();
        names.sort();
        Err(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnv(HashMap<&'static str, &'static str>);

    impl EnvSource for FakeEnv {
        fn get(&self, name: &str) -> Option<String> {
            self.0.get(name).map(|v| (*v).to_string())
        }
    }

    #[test]
    fn substitutes_present_variable() {
        let env = FakeEnv(HashMap::from([("REGION", "us-east-1")]));
        let out = expand("region: ${REGION}", &env).unwrap();
        assert_eq!(out, "region: us-east-1");
    }

    #[test]
    fn falls_back_to_default_when_absent() {
        let env = FakeEnv(HashMap::new());
        let out = expand("region: ${REGION:-us-west-2}", &env).unwrap();
        assert_eq!(out, "region: us-west-2");
    }

    #[test]
    fn present_variable_overrides_default() {
        let env = FakeEnv(HashMap::from([("REGION", "eu-west-1")]));
        let out = expand("region: ${REGION:-us-west-2}", &env).unwrap();
        assert_eq!(out, "region: eu-west-1");
    }

    #[test]
    fn unresolved_reference_without_default_is_reported() {
        let env = FakeEnv(HashMap::new());
        let err = expand("key: ${MISSING}", &env).unwrap_err();
        assert_eq!(err, vec!["MISSING".to_string()]);
    }

    #[test]
    fn empty_default_is_a_valid_fallback() {
        let env = FakeEnv(HashMap::new());
        let out = expand("key: ${MISSING:-}", &env).unwrap();
        assert_eq!(out, "key: ");
    }
}
