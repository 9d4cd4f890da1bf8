//! dfdrift common types and errors.
//!
//! This crate provides foundational types shared across dfdrift-core modules:
//! - Event labels and directly-follows pairs
//! - Distribution kinds
//! - The unified error type with stable codes

pub mod error;
pub mod kind;
pub mod label;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use kind::DistributionKind;
pub use label::{DirectlyFollowsPair, EventLabel};
