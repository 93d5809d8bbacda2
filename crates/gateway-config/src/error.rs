//! Configuration-loading failures.

use thiserror::Error;

/// Everything that can go wrong turning configuration text into a usable
/// [`crate::registry::InstanceRegistry`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read from disk.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// One or more `${NAME}` references had no value and no default.
    #[error("unresolved environment variable(s): {}", .0.join(", "))]
    UnresolvedEnv(Vec<String>),

    /// The expanded text was not valid YAML, or did not match the
    /// document shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more instances, or the document as a whole, failed
    /// validation. Every violation found is reported together.
    #[error("configuration is invalid:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}
