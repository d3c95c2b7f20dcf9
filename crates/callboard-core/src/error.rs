//! Common error types for callboard.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while interpreting backend-owned values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A role string outside the known hierarchy.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// An account status string outside the known set.
    #[error("unknown user status: {0}")]
    UnknownStatus(String),

    /// A user identifier that is empty or otherwise unusable.
    #[error("invalid user ID: {0}")]
    InvalidUserId(String),
}
