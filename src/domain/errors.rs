//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors raised by
//! the LeagueApps API are grouped in [`ApiError`] so the export loop can tell
//! recoverable conditions from the ones that end a run. Third-party error
//! types are converted to strings at the boundary and never leak out.

use std::time::Duration;
use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum LappsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LeagueApps API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkpoint/state errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised while talking to the token or export endpoints
///
/// The first five variants mirror the failure taxonomy of the export loop.
/// Only [`ApiError::AuthFailure`], [`ApiError::FatalClientError`] and
/// [`ApiError::RetryExhausted`] ever surface from a run; the rest are handled
/// inside the loop.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token endpoint answered with something other than 200
    #[error("Failed to obtain access token ({status}): {body}")]
    AuthFailure { status: u16, body: String },

    /// Export endpoint answered 401
    #[error("Access token expired or rejected")]
    TokenExpired,

    /// 429, 5xx or a request timeout
    #[error("Transient server error: {0}")]
    TransientServerError(TransientCause),

    /// Any other non-200 status from the export endpoint
    #[error("Unexpected error ({status}): {reason}")]
    FatalClientError { status: u16, reason: String },

    /// The attempt ceiling was reached without progress
    ///
    /// `last` is the [`ApiError::TokenExpired`] or
    /// [`ApiError::TransientServerError`] that used up the final attempt.
    #[error("Giving up after {attempts} attempts without progress (last error: {last})")]
    RetryExhausted { attempts: u32, last: Box<ApiError> },

    /// Failed to reach the server at all
    #[error("Failed to connect: {0}")]
    Connection(String),

    /// Response body could not be interpreted
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// What made a request transiently fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientCause {
    /// 429 or 5xx
    Status(u16),
    /// No response within the request timeout
    Timeout(Duration),
    /// Connection could not be established
    Connect(String),
}

impl std::fmt::Display for TransientCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransientCause::Status(status) => write!(f, "status {status}"),
            TransientCause::Timeout(after) => write!(f, "timed out after {}s", after.as_secs_f64()),
            TransientCause::Connect(msg) => write!(f, "connection failed: {msg}"),
        }
    }
}

impl LappsError {
    /// Process exit code an operator sees for this error
    ///
    /// * `2` - configuration or validation problem
    /// * `3` - token endpoint refused the assertion
    /// * `4` - retry ceiling reached
    /// * `5` - fatal client error or anything else
    pub fn exit_code(&self) -> i32 {
        match self {
            LappsError::Configuration(_) | LappsError::Validation(_) => 2,
            LappsError::Api(ApiError::AuthFailure { .. }) => 3,
            LappsError::Api(ApiError::RetryExhausted { .. }) => 4,
            _ => 5,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for LappsError {
    fn from(err: std::io::Error) -> Self {
        LappsError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LappsError {
    fn from(err: serde_json::Error) -> Self {
        LappsError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for LappsError {
    fn from(err: toml::de::Error) -> Self {
        LappsError::Configuration(format!("TOML parse error: {err}"))
    }
}
