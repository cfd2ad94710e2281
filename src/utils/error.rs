//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use suluk_api::ApiError;
use suluk_core::CoreError;
use thiserror::Error;

use crate::services::analysis::AnalysisError;
use crate::services::auth::AuthError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential or config file storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation that needs an authenticated session ran without one
    #[error("Not logged in")]
    NotAuthenticated,

    /// Records service errors
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// Login or registration rejected
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
