//! API error types for the tracker client.

use thiserror::Error;

/// Errors that can occur when talking to the tracker API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server rejected the request as malformed or invalid.
    #[error("Request rejected: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The record was modified by another client.
    #[error("Conflict: the issue was modified by someone else. Refresh and try again")]
    Conflict,

    /// Rate limited by the server.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Server-side failure.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network or HTTP transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body could not be parsed.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The server could not be reached at all.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(context.to_string()),
            404 => ApiError::NotFound(context.to_string()),
            409 => ApiError::Conflict,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }
}
