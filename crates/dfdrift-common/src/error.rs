//! Error types for dfdrift.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//!
//! # Agent-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 30,
//!   "category": "classification",
//!   "message": "event 3 is missing attribute 'lifecycle:transition'",
//!   "recoverable": false,
//!   "context": { "attribute": "lifecycle:transition", "event_index": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::kind::DistributionKind;

/// Result type alias for dfdrift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration loading and validation.
    Config,
    /// Malformed trace input.
    Input,
    /// Event classification.
    Classification,
    /// Distribution comparison.
    Comparison,
    /// Shared-store locking.
    Concurrency,
    /// File I/O and serialization.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Classification => write!(f, "classification"),
            ErrorCategory::Comparison => write!(f, "comparison"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for dfdrift.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Input errors (20-29)
    #[error("malformed trace on line {line}: {message}")]
    TraceParse { line: usize, message: String },

    // Classification and comparison errors (30-39)
    #[error("event {event_index} is missing attribute '{attribute}'")]
    MissingAttribute {
        attribute: String,
        event_index: usize,
    },

    #[error("cannot compare a {left} distribution with a {right} distribution")]
    TypeMismatch {
        left: DistributionKind,
        right: DistributionKind,
    },

    #[error("insufficient data for comparison: {0}")]
    InsufficientData(String),

    // Concurrency errors (40-49)
    #[error("distribution lock poisoned: {0}")]
    LockPoisoned(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Classification and comparison errors
    /// - 40-49: Concurrency errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::TraceParse { .. } => 20,
            Error::MissingAttribute { .. } => 30,
            Error::TypeMismatch { .. } => 31,
            Error::InsufficientData(_) => 32,
            Error::LockPoisoned(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::TraceParse { .. } => ErrorCategory::Input,
            Error::MissingAttribute { .. } => ErrorCategory::Classification,
            Error::TypeMismatch { .. } | Error::InsufficientData(_) => ErrorCategory::Comparison,
            Error::LockPoisoned(_) => ErrorCategory::Concurrency,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Recoverable errors may go away by fixing configuration or retrying
    /// once more data has accumulated. Retrying is always the caller's call.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => true,
            Error::TraceParse { .. } => false,
            Error::MissingAttribute { .. } => false,
            Error::TypeMismatch { .. } => false,
            // More traces may make the comparison well-defined.
            Error::InsufficientData(_) => true,
            Error::LockPoisoned(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::TraceParse { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::MissingAttribute {
                attribute,
                event_index,
            } => {
                context.insert("attribute".to_string(), serde_json::json!(attribute));
                context.insert("event_index".to_string(), serde_json::json!(event_index));
            }
            Error::TypeMismatch { left, right } => {
                context.insert("left_kind".to_string(), serde_json::json!(left));
                context.insert("right_kind".to_string(), serde_json::json!(right));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
