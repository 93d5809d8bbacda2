//! # Gateway Config
//!
//! Turns the gateway's YAML configuration file into a validated,
//! queryable [`InstanceRegistry`].
//!
//! Loading happens in three stages, each of which can fail on its own:
//! 1. [`env`] expands `${NAME}` / `${NAME:-default}` references against
//!    the process environment.
//! 2. [`raw`] deserializes the expanded text into the document shape and
//!    lowers each entry into a `gateway_core::Instance`.
//! 3. [`registry`] validates the result — per-instance invariants plus
//!    cross-instance path-prefix rules — collecting every violation
//!    before [`loader::load_config`] fails, rather than stopping at the
//!    first.
//!
//! Building a live `Arc<dyn CredentialStrategy>` from a [`strategy::StrategyConfig`]
//! is intentionally left to `gateway-server`, the only crate that depends
//! on both this one and `gateway-credentials`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod loader;
pub mod raw;
pub mod registry;
pub mod strategy;

pub use error::ConfigError;
pub use loader::{build_registry, load_config, load_from_str};
pub use raw::{GlobalConfig, RawConfig};
pub use registry::InstanceRegistry;
pub use strategy::StrategyConfig;
