//! Error types for SpatialIQ

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a raw field was rejected by the normalizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationReason {
    /// Required field absent (or empty)
    Missing,
    /// Value could not be coerced to the declared type
    WrongType { expected: String },
    /// Coerced value falls outside the declared domain
    OutOfDomain { domain: String },
}

impl ValidationReason {
    /// Short reason label: "missing", "wrong type" or "out of domain"
    pub fn label(&self) -> &'static str {
        match self {
            ValidationReason::Missing => "missing",
            ValidationReason::WrongType { .. } => "wrong type",
            ValidationReason::OutOfDomain { .. } => "out of domain",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Missing => write!(f, "missing"),
            ValidationReason::WrongType { expected } => {
                write!(f, "wrong type (expected {expected})")
            }
            ValidationReason::OutOfDomain { domain } => {
                write!(f, "out of domain (expected {domain})")
            }
        }
    }
}

/// A single field failed normalization
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("invalid field '{field}': {reason}")]
pub struct ValidationError {
    /// Name of the offending raw field
    pub field: String,
    /// Violated constraint
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: ValidationReason::Missing,
        }
    }

    pub fn wrong_type(field: &str, expected: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: ValidationReason::WrongType {
                expected: expected.into(),
            },
        }
    }

    pub fn out_of_domain(field: &str, domain: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: ValidationReason::OutOfDomain {
                domain: domain.into(),
            },
        }
    }
}

/// Errors that can occur outside of per-field validation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid classifier configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
