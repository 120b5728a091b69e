//! Application error types
//!
//! Unified error handling for the binaries and other outer layers.

use chat_core::DomainError;
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;
use crate::telemetry::TracingError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // I/O and decoding
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Startup
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get error code for logs and reports
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the error was caused by the caller's input
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::NotFound(_) | Self::Json(_) => true,
            Self::Domain(e) => e.is_malformed() || e.is_not_found(),
            _ => false,
        }
    }

    /// Process exit code for command-line tools
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78,
            _ if self.is_input_error() => 65,
            _ => 1,
        }
    }

    /// Create a not found error for a resource
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(msg: impl fmt::Display) -> Self {
        Self::InvalidInput(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Serializable error report
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.to_string(),
            details: None,
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
