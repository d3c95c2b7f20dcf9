//! The profile resolved for the signed-in user.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::role::{Role, UserStatus};

/// Profile returned by `GET /api/auth/me`.
///
/// `name` and `status` are optional because the backend omits them for some
/// accounts; `role` is mandatory and must be one of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier.
    pub id: UserId,
    /// Sign-in email address.
    pub email: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Position in the role hierarchy.
    pub role: Role,
    /// Approval status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UserProfile {
    /// Name to show in a header: the display name, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Returns `true` if the account is still waiting for approval.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Some(UserStatus::Pending)
    }
}
