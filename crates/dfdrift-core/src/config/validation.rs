//! Semantic validation for configuration.
//!
//! Catches values that deserialize fine but make no sense for detection.

use thiserror::Error;

use super::DriftConfig;

/// Errors that can occur during semantic validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("epsilon must be finite and >= 0 (got {value})")]
    EpsilonRange { value: f64 },

    #[error("alpha must be in (0, 1) (got {value})")]
    AlphaRange { value: f64 },

    #[error("classifier.{field} must not be empty")]
    EmptyAttributeKey { field: &'static str },
}

/// Validate a config, in field order.
pub fn validate_config(config: &DriftConfig) -> Result<(), ValidationError> {
    if !config.epsilon.is_finite() || config.epsilon < 0.0 {
        return Err(ValidationError::EpsilonRange {
            value: config.epsilon,
        });
    }
    if !(config.alpha > 0.0 && config.alpha < 1.0) {
        return Err(ValidationError::AlphaRange {
            value: config.alpha,
        });
    }
    if config.classifier.activity_key.is_empty() {
        return Err(ValidationError::EmptyAttributeKey {
            field: "activity_key",
        });
    }
    if config.classifier.lifecycle_key.is_empty() {
        return Err(ValidationError::EmptyAttributeKey {
            field: "lifecycle_key",
        });
    }
    Ok(())
}
