//! Session value and state machine.
//!
//! ```text
//!              ┌─────────────┐
//!              │  Resolving  │
//!              └──────┬──────┘
//!        token ok     │     no token / rejected
//!        ┌────────────┴─────────────┐
//!        ▼                          ▼
//! ┌───────────────┐  logout  ┌─────────────┐
//! │ Authenticated │─────────▶│  Anonymous  │◀─┐ register
//! │               │◀─────────│             │──┘ (pending)
//! └───────────────┘  login   └─────────────┘
//! ```

use serde::Serialize;

use callboard_core::{Role, UserProfile};

/// Coarse authentication state derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Initial state; the stored token has not been checked yet.
    Resolving,
    /// A user profile has been resolved for the current token.
    Authenticated,
    /// No usable token.
    Anonymous,
}

impl SessionState {
    /// Human-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }
}

/// Client-held authentication state.
///
/// ## Invariants
/// - `user` is `Some` only if `token` is `Some`.
/// - `loading` is true only while the stored token is being resolved or a
///   login/register call is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Session token, when one has been validated or is being validated.
    #[serde(skip)]
    pub token: Option<String>,
    /// Profile resolved for `token`.
    pub user: Option<UserProfile>,
    /// A network operation is in flight.
    pub loading: bool,
    /// The stored token has been checked at least once.
    pub resolved: bool,
}

impl Session {
    /// The initial session, holding whatever token was read from storage.
    #[must_use]
    pub const fn resolving(token: Option<String>) -> Self {
        Self {
            token,
            user: None,
            loading: true,
            resolved: false,
        }
    }

    /// A resolved session with no user.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            token: None,
            user: None,
            loading: false,
            resolved: true,
        }
    }

    /// A resolved session for `user`.
    #[must_use]
    pub const fn authenticated(token: String, user: UserProfile) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
            loading: false,
            resolved: true,
        }
    }

    /// Derive the coarse state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if !self.resolved {
            SessionState::Resolving
        } else if self.user.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Returns `true` if a user is resolved.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated)
    }

    /// Returns `true` if the current user's role is at least `required`.
    ///
    /// Always `false` without a user.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role.satisfies(required))
    }
}

/// Check if a state transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: SessionState, to: SessionState) -> bool {
    use SessionState::{Anonymous, Authenticated, Resolving};

    matches!(
        (from, to),
        // Resolution ends in either settled state
        (Resolving, Authenticated | Anonymous)
            // Login/register, or a pending registration that changes nothing
            | (Anonymous, Authenticated | Anonymous)
            // Logout/rejection, or a profile refresh / re-login
            | (Authenticated, Anonymous | Authenticated)
    )
}

#[cfg(test)]
mod tests {
    use callboard_core::UserId;

    use super::*;

    fn user(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::from(1),
            email: "a@b.com".to_string(),
            name: None,
            role,
            status: None,
        }
    }

    #[test]
    fn derived_states() {
        assert_eq!(
            Session::resolving(Some("T1".to_string())).state(),
            SessionState::Resolving
        );
        assert_eq!(Session::anonymous().state(), SessionState::Anonymous);
        assert_eq!(
            Session::authenticated("T1".to_string(), user(Role::User)).state(),
            SessionState::Authenticated
        );
    }

    #[test]
    fn constructors_hold_invariants() {
        let resolving = Session::resolving(None);
        assert!(resolving.loading);
        assert!(resolving.user.is_none());

        let anonymous = Session::anonymous();
        assert!(!anonymous.loading);
        assert!(anonymous.token.is_none());

        let authenticated = Session::authenticated("T1".to_string(), user(Role::User));
        assert!(authenticated.token.is_some());
        assert!(!authenticated.loading);
    }

    #[test]
    fn role_checks_without_user_are_false() {
        assert!(!Session::anonymous().has_role(Role::User));
        assert!(!Session::resolving(Some("T1".to_string())).has_role(Role::User));
    }

    #[test]
    fn role_checks_follow_hierarchy() {
        let admin = Session::authenticated("T1".to_string(), user(Role::Admin));
        assert!(admin.has_role(Role::User));
        assert!(admin.has_role(Role::Admin));
        assert!(!admin.has_role(Role::SuperAdmin));
    }

    #[test]
    fn serialization_omits_token() {
        let session = Session::authenticated("secret".to_string(), user(Role::User));
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("a@b.com"));
    }

    #[test]
    fn valid_transitions() {
        use SessionState::{Anonymous, Authenticated, Resolving};

        assert!(is_valid_transition(Resolving, Authenticated));
        assert!(is_valid_transition(Resolving, Anonymous));
        assert!(is_valid_transition(Anonymous, Authenticated));
        assert!(is_valid_transition(Anonymous, Anonymous));
        assert!(is_valid_transition(Authenticated, Anonymous));
    }

    #[test]
    fn nothing_returns_to_resolving() {
        use SessionState::{Anonymous, Authenticated, Resolving};

        assert!(!is_valid_transition(Anonymous, Resolving));
        assert!(!is_valid_transition(Authenticated, Resolving));
        assert!(!is_valid_transition(Resolving, Resolving));
    }
}
