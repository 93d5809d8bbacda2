//! Multi-tenant AI gateway fronting heterogeneous model-inference providers
//! behind transparent and protocol-translating facades.
//!
//! Loads configuration, detects the platform's ambient workload-identity
//! capabilities, elects a credential manager per instance, and serves the
//! resulting router over plain HTTP until a termination signal arrives.

use clap::Parser;
use gateway_core::PlatformCapabilities;
use gateway_platform::PlatformDetector;
use gateway_providers::ProviderClient;
use gateway_server::{build_credential_manager, shutdown_signal, AppState};
use gateway_telemetry::{init_logging, LoggingConfig, Metrics};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Command-line entry point.
#[derive(Parser, Debug)]
#[command(name = "llm-inference-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the gateway's YAML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.yaml")]
    config: String,

    /// Load and validate the configuration, then exit without starting the server.
    #[arg(long)]
    validate: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON instead of human-readable text.
    #[arg(long, env = "GATEWAY_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::new().with_level(&cli.log_level);
    if !cli.log_json {
        logging = logging.with_plain_text();
    }
    if let Err(e) = init_logging(&logging) {
        eprintln!("failed to initialize logging: {e}");
    }

    info!(version = env!("CARGO_PKG_VERSION"), "starting gateway");

    if let Err(e) = run(cli).await {
        error!(error = %e, "gateway exited with error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registry = gateway_config::load_config(&cli.config).await?;
    info!(path = %cli.config, instances = registry.iter().count(), "configuration loaded");

    if cli.validate {
        info!("configuration is valid");
        return Ok(());
    }

    let caps: PlatformCapabilities = PlatformDetector::detect();
    info!(?caps, "platform capabilities detected");

    let registry = Arc::new(registry);

    let mut credentials = HashMap::with_capacity(registry.iter().count());
    for instance in registry.iter() {
        let strategies = registry.strategies_for(&instance.name);
        let manager = build_credential_manager(&instance.name, strategies, &caps).await?;
        credentials.insert(instance.name.clone(), manager);
    }
    info!(managers = credentials.len(), "credential managers elected");

    let provider_client = Arc::new(ProviderClient::new()?);
    let metrics = Metrics::new();

    let state = AppState::new(registry.clone(), credentials, provider_client, metrics);
    let app = gateway_server::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], registry.global().port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("gateway stopped");
    Ok(())
}
