//! Structured JSON logging init, the plain-logging counterpart to
//! [`crate::tracing_setup::init_tracing`] for deployments that don't need
//! OpenTelemetry export.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Logging configuration consumed by [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `RUST_LOG`-style filter directive, used when `RUST_LOG` itself is
    /// unset.
    pub level: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl LoggingConfig {
    /// Start from the default (`info`, JSON) configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default filter level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Switch to human-readable (non-JSON) formatting, for local
    /// development.
    #[must_use]
    pub fn with_plain_text(mut self) -> Self {
        self.json = false;
        self
    }
}

/// Initialize the global `tracing` subscriber from `config`.
///
/// # Errors
/// Returns an error if a subscriber has already been installed for this
/// process (`main` calls this exactly once).
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_filter(filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_filter(filter))
            .try_init()
    };

    result.map_err(|e| format!("failed to install tracing subscriber: {e}"))
}
