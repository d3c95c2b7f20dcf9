//! Outcomes of auth operations and registration input validation.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

use callboard_client::RegisterRequest;

/// Notice shown when a registration awaits approval and the backend sent no
/// message of its own.
pub const PENDING_APPROVAL_MESSAGE: &str = "Your account is pending approval.";

/// Outcome of an auth-initiating operation.
///
/// Views branch on this instead of catching errors. On the wire it maps to
/// `{success:true, authenticated:true}`, `{success:true, pending:true,
/// message}` or `{success:false, error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The session is now authenticated.
    Authenticated,
    /// The account exists but awaits administrative approval.
    Pending {
        /// Notice for the user; not an error.
        message: String,
    },
    /// The operation failed; the session is unchanged or anonymous.
    Failure {
        /// Human-readable reason.
        error: String,
    },
}

impl AuthResult {
    pub(crate) fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Returns `true` for `Authenticated` and `Pending`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }

    /// Returns `true` if the account awaits approval.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error } => Some(error),
            _ => None,
        }
    }
}

impl Serialize for AuthResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Authenticated => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("authenticated", &true)?;
                map.end()
            }
            Self::Pending { message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("pending", &true)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
            Self::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// Registration input rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Email was blank.
    #[error("Email is required for registration")]
    MissingEmail,
    /// Password was empty.
    #[error("Password is required for registration")]
    MissingPassword,
    /// Name was blank.
    #[error("Name is required for registration")]
    MissingName,
    /// Phone was blank.
    #[error("Phone is required for registration")]
    MissingPhone,
}

/// Validated registration input.
///
/// ## Invariants
/// - `email`, `name` and `phone` are trimmed and non-empty.
/// - `password` is non-empty and kept exactly as given.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    email: String,
    password: String,
    name: String,
    phone: String,
}

impl Registration {
    /// Validate raw registration input.
    ///
    /// # Errors
    ///
    /// Returns the first missing field, checking name and phone before the
    /// credentials.
    pub fn new(
        email: &str,
        password: &str,
        name: &str,
        phone: &str,
    ) -> Result<Self, RegistrationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationError::MissingName);
        }
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(RegistrationError::MissingPhone);
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(RegistrationError::MissingEmail);
        }
        if password.is_empty() {
            return Err(RegistrationError::MissingPassword);
        }

        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phone number.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub(crate) fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.email.clone(),
            password: self.password.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}
