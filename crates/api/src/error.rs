//! API Error Types
//!
//! Every failure a caller of the dispatcher can observe. The variants are kept
//! distinct so the session layer can tell "the server said no" from "nothing
//! answered", and the analysis layer can tell a broken stream from a clean end.

use serde::Deserialize;
use suluk_core::streaming::DecodeError;
use thiserror::Error;

/// Message shown when no server-provided explanation is available.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, DNS, ...).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A streaming body broke after the response started.
    #[error("Stream read error: {message}")]
    StreamRead { message: String },

    /// The byte stream ended inside a multi-byte character.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A success response whose body did not match the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// FastAPI error bodies: `{"detail": "..."}` or a validation list.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
}

#[derive(Debug, Deserialize)]
struct ValidationIssue {
    msg: String,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn stream_read(message: impl Into<String>) -> Self {
        Self::StreamRead {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The `detail` message from a server error body, if present.
    pub fn server_detail(&self) -> Option<String> {
        let ApiError::Http { body, .. } = self else {
            return None;
        };
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail {
            ErrorDetail::Message(msg) if !msg.trim().is_empty() => Some(msg),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Validation(issues) if !issues.is_empty() => Some(
                issues
                    .into_iter()
                    .map(|i| i.msg)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            ErrorDetail::Validation(_) => None,
        }
    }

    /// User-facing text: the server message when the server rejected the
    /// request, `http_fallback` when it rejected without one, and a generic
    /// message for everything else.
    pub fn user_message(&self, http_fallback: &str) -> String {
        match self {
            ApiError::Http { .. } => self
                .server_detail()
                .unwrap_or_else(|| http_fallback.to_string()),
            _ => UNEXPECTED_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::network(err.to_string())
    }
}
