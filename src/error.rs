//! Error taxonomy for validation, configuration and the user API client.
//!
//! This module provides:
//! - [`ValidationError`], raised by the engine when a caller opts into
//!   throwing mode
//! - [`ConfigError`] for project configuration resolution
//! - [`ApiError`] / [`TransportError`] for the HTTP client
//! - [`ErrorCode`], a stable classification used by logs and metrics

use crate::validation::{FieldError, ItemFailure};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Input data violates schema constraints
    StructuralMismatch,
    /// The validation machinery itself failed
    UnexpectedFault,
    /// One or more batch items failed
    BatchFailed,
    /// Configuration could not be resolved or is invalid
    InvalidConfig,
    /// The HTTP exchange failed
    Transport,
    /// The remote answered with a payload that failed validation
    InvalidResponse,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StructuralMismatch => "structural_mismatch",
            ErrorCode::UnexpectedFault => "unexpected_fault",
            ErrorCode::BatchFailed => "batch_failed",
            ErrorCode::InvalidConfig => "invalid_config",
            ErrorCode::Transport => "transport",
            ErrorCode::InvalidResponse => "invalid_response",
        }
    }

    /// Error category for metrics
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::StructuralMismatch | ErrorCode::BatchFailed => "validation_error",
            ErrorCode::UnexpectedFault => "internal_error",
            ErrorCode::InvalidConfig => "config_error",
            ErrorCode::Transport => "io_error",
            ErrorCode::InvalidResponse => "upstream_error",
        }
    }

    /// Check if this error type is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::Transport)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Raised by the validation boundary when `throwOnError` is set.
///
/// Structural and batch failures display their summary; faults display the
/// underlying fault message, with the summary kept alongside.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{summary}")]
    StructuralMismatch {
        summary: String,
        errors: Vec<FieldError>,
    },

    #[error("{message}")]
    UnexpectedFault { message: String, summary: String },

    #[error("{summary}")]
    BatchFailed {
        summary: String,
        failures: Vec<ItemFailure>,
    },
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::StructuralMismatch { .. } => ErrorCode::StructuralMismatch,
            ValidationError::UnexpectedFault { .. } => ErrorCode::UnexpectedFault,
            ValidationError::BatchFailed { .. } => ErrorCode::BatchFailed,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            ValidationError::StructuralMismatch { summary, .. }
            | ValidationError::UnexpectedFault { summary, .. }
            | ValidationError::BatchFailed { summary, .. } => summary,
        }
    }

    /// Field-level detail; empty for faults and batch failures.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ValidationError::StructuralMismatch { errors, .. } => errors,
            _ => &[],
        }
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("configuration unavailable: {0}")]
    Unavailable(String),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidConfig
    }
}

// =============================================================================
// API CLIENT
// =============================================================================

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why an API operation failed.
#[derive(Debug, Error)]
pub enum ApiFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller's own payload failed validation before sending.
    #[error(transparent)]
    InvalidInput(ValidationError),
}

/// A user-facing API failure. Displays the operation, keeps the cause.
#[derive(Debug, Error)]
#[error("{operation}")]
pub struct ApiError {
    pub operation: String,
    #[source]
    pub source: ApiFailure,
}

impl ApiError {
    pub fn new(operation: impl Into<String>, source: impl Into<ApiFailure>) -> Self {
        Self {
            operation: operation.into(),
            source: source.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match &self.source {
            ApiFailure::Transport(_) => ErrorCode::Transport,
            ApiFailure::InvalidInput(_) => ErrorCode::StructuralMismatch,
            ApiFailure::Validation(ValidationError::UnexpectedFault { .. }) => {
                ErrorCode::UnexpectedFault
            }
            ApiFailure::Validation(_) => ErrorCode::InvalidResponse,
        }
    }
}
