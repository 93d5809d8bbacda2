//! Validated newtypes shared across the canonical request/response model.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generated identifier for an inbound request, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh request ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated model identifier. Non-empty, no surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(String);

impl ModelId {
    /// Validate and wrap a model identifier.
    ///
    /// # Errors
    /// Returns an error if the identifier is empty or not trimmed.
    pub fn new(raw: &str) -> Result<Self, GatewayError> {
        if raw.is_empty() || raw.trim() != raw {
            return Err(GatewayError::invalid_request(
                "model must be a non-empty, trimmed string",
                "invalid_model",
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tenant identifier, opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

/// A provider-assigned instance name (see [`crate::instance::Instance`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceName(pub String);

impl fmt::Display for InstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated sampling temperature in `[0.0, 2.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature(f32);

impl Temperature {
    /// Validate and wrap a temperature value.
    ///
    /// # Errors
    /// Returns an error if outside `[0.0, 2.0]`.
    pub fn new(value: f32) -> Result<Self, GatewayError> {
        if !(0.0..=2.0).contains(&value) {
            return Err(GatewayError::invalid_request(
                format!("temperature must be between 0.0 and 2.0, got {value}"),
                "invalid_temperature",
            ));
        }
        Ok(Self(value))
    }

    /// The validated value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }
}

/// A validated nucleus-sampling parameter in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopP(f32);

impl TopP {
    /// Validate and wrap a top-p value.
    ///
    /// # Errors
    /// Returns an error if outside `[0.0, 1.0]`.
    pub fn new(value: f32) -> Result<Self, GatewayError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(GatewayError::invalid_request(
                format!("top_p must be between 0.0 and 1.0, got {value}"),
                "invalid_top_p",
            ));
        }
        Ok(Self(value))
    }

    /// The validated value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }
}

/// A validated token budget, must be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxTokens(u32);

impl MaxTokens {
    /// Validate and wrap a max-tokens value.
    ///
    /// # Errors
    /// Returns an error if zero.
    pub fn new(value: u32) -> Result<Self, GatewayError> {
        if value == 0 {
            return Err(GatewayError::invalid_request(
                "max_tokens must be at least 1",
                "invalid_max_tokens",
            ));
        }
        Ok(Self(value))
    }

    /// The validated value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_rejects_empty_and_untrimmed() {
        assert!(ModelId::new("").is_err());
        assert!(ModelId::new(" gpt-4 ").is_err());
        assert!(ModelId::new("gpt-4").is_ok());
    }

    #[test]
    fn temperature_range() {
        assert!(Temperature::new(-0.1).is_err());
        assert!(Temperature::new(2.1).is_err());
        assert!(Temperature::new(0.7).is_ok());
    }

    #[test]
    fn max_tokens_rejects_zero() {
        assert!(MaxTokens::new(0).is_err());
        assert!(MaxTokens::new(1).is_ok());
    }
}
