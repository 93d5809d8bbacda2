//! # Gateway Resilience
//!
//! Resilience primitives shared by the credential manager and the provider
//! clients:
//! - Circuit breaker, reused by `gateway-credentials::manager` as the
//!   30s-cooldown "tainted" window for a failed strategy
//! - Retry policy with exponential backoff, for upstream provider calls
//!
//! - Timeout management, for the credential-acquisition and
//!   non-streaming-request deadlines

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod retry;
pub mod timeout;

// Re-export main types
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{RetryPolicy, RetryConfig, RetryResult};
pub use timeout::{TimeoutManager, TimeoutConfig};
