//! # Gateway Server
//!
//! Wires the rest of the workspace into an `axum` application: route
//! resolution and dispatch, the minimal `/health`,
//! `/ready`, `/metrics` stand-ins, graceful shutdown,
//! and the one module that bridges `gateway-config`'s [`StrategyConfig`]
//! declarations into live [`gateway_credentials::CredentialManager`]s.
//!
//! [`StrategyConfig`]: gateway_config::StrategyConfig

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use credentials::build_credential_manager;
pub use error::ApiError;
pub use health::HealthResponse;
pub use routes::router;
pub use shutdown::shutdown_signal;
pub use state::AppState;
