//! Centralized error types.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages. All error types use `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::form::{SubmitError, ValidationError};

/// The main application error type.
///
/// Aggregates every error the client can produce, providing user-friendly
/// messages while preserving the underlying context for debugging.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Form submission errors, including partial failures.
    #[error("{0}")]
    Submit(#[from] SubmitError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Submit(SubmitError::Validation(e))
    }
}

impl AppError {
    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        AppError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    ///
    /// Suitable for showing directly to users, without technical jargon.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find a configuration directory. Check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) | ConfigError::WriteError(_) => {
                    "Could not save configuration. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read the configuration file.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "The configuration file is invalid. Check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
                ConfigError::ProfileNotFound(name) => format!("Profile '{}' not found.", name),
                ConfigError::NoProfile => e.to_string(),
            },
            AppError::Api(e) => match e {
                ApiError::BadRequest(msg) => format!("The tracker rejected the request: {}", msg),
                ApiError::NotFound(resource) => format!("{}.", resource),
                ApiError::Conflict => {
                    "This issue was modified by someone else. Refresh and try again.".to_string()
                }
                ApiError::RateLimited => {
                    "Too many requests. Wait a moment and try again.".to_string()
                }
                ApiError::ServerError(_) => "Tracker server error. Try again later.".to_string(),
                ApiError::Network(_) => {
                    "Connection failed. Check your network and tracker URL.".to_string()
                }
                ApiError::InvalidResponse(_) => {
                    "Unexpected response from the tracker. Try again.".to_string()
                }
                ApiError::ConnectionFailed(_) => {
                    "Could not connect to the tracker. Check your URL and network.".to_string()
                }
            },
            AppError::Submit(e) => e.to_string(),
            AppError::Io(_) => "A file operation failed. Check file permissions.".to_string(),
            AppError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors can be retried or worked around without
    /// reconfiguring anything.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Api(e) => e.is_retryable() || matches!(e, ApiError::Conflict),
            AppError::Submit(SubmitError::Validation(_)) => true,
            AppError::Submit(SubmitError::Api(e)) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
