//! Request error types.

use thiserror::Error;

use crate::storage::StoreError;

/// A result type using `RequestError`.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Message used when the backend gives no usable error message.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Errors surfaced by the HTTP client.
///
/// Every variant carries a human-readable message (its `Display`) and, for
/// responses that reached the backend, the HTTP status code.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The configured request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// A successful response whose body is not JSON.
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),

    /// The backend answered with a non-success status.
    ///
    /// `Display` is exactly the backend-provided message.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body, or [`GENERIC_ERROR_MESSAGE`].
        message: String,
    },

    /// A successful JSON response that does not match the endpoint contract.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Credentials could not be read from durable storage.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl RequestError {
    /// Human-readable message for display in a view.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status code, when the backend answered.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the backend rejected the credentials (HTTP 401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// Returns `true` if the failure happened before a response arrived.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
