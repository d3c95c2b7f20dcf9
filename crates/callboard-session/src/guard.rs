//! Route guards.
//!
//! Guards are pure functions of a [`Session`] snapshot. They never redirect
//! while the session is still resolving, so a stored token gets its chance
//! before the user is sent to the login view.
//!
//! ```text
//!                  ┌──────────────┬──────────────────┬──────────────────────┐
//!                  │  Resolving   │  Authenticated   │  Anonymous           │
//! ┌────────────────┼──────────────┼──────────────────┼──────────────────────┤
//! │ protect        │  Loading     │  Render          │  Redirect(Login)     │
//! │ login_gate     │  Render      │  Redirect(Dash)  │  Render              │
//! │ require_role   │  Loading     │  Render / Dash   │  Redirect(Login)     │
//! └────────────────┴──────────────┴──────────────────┴──────────────────────┘
//! ```

use callboard_core::Role;

use crate::state::{Session, SessionState};

/// Navigation targets a guard can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// The login view.
    Login,
    /// The dashboard home.
    Dashboard,
}

impl Route {
    /// Path of the route.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// What a view should do for the current session.
///
/// Redirects replace the current location; there is no return path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a neutral loading placeholder.
    Loading,
    /// Render the requested view.
    Render,
    /// Navigate elsewhere.
    Redirect(Route),
}

/// Guard a view that requires a signed-in user.
#[must_use]
pub const fn protect(session: &Session) -> GuardDecision {
    match session.state() {
        SessionState::Resolving => GuardDecision::Loading,
        SessionState::Authenticated => GuardDecision::Render,
        SessionState::Anonymous => GuardDecision::Redirect(Route::Login),
    }
}

/// Guard the login view: signed-in users go to the dashboard.
#[must_use]
pub const fn login_gate(session: &Session) -> GuardDecision {
    match session.state() {
        SessionState::Authenticated => GuardDecision::Redirect(Route::Dashboard),
        SessionState::Resolving | SessionState::Anonymous => GuardDecision::Render,
    }
}

/// Guard a view that requires at least `required`.
///
/// Signed-in users below the role are sent to the dashboard home.
#[must_use]
pub fn require_role(session: &Session, required: Role) -> GuardDecision {
    match protect(session) {
        GuardDecision::Render if !session.has_role(required) => {
            GuardDecision::Redirect(Route::Dashboard)
        }
        decision => decision,
    }
}

/// Decide what to do for `path`.
///
/// `/login` is gated by [`login_gate`]. `/dashboard` and its children need
/// a signed-in user; `/dashboard/users` additionally needs an admin. Unknown
/// dashboard children fall back to the dashboard home and any other path
/// redirects to the login view.
#[must_use]
pub fn route(path: &str, session: &Session) -> GuardDecision {
    let path = path.trim_end_matches('/');

    if path == Route::Login.path() {
        return login_gate(session);
    }

    let Some(rest) = path.strip_prefix(Route::Dashboard.path()) else {
        return GuardDecision::Redirect(Route::Login);
    };

    match rest {
        "" | "/agents" | "/calls" | "/analytics" => protect(session),
        _ if rest.starts_with("/analytics/") => protect(session),
        "/users" => require_role(session, Role::Admin),
        _ if rest.starts_with('/') => match protect(session) {
            GuardDecision::Render => GuardDecision::Redirect(Route::Dashboard),
            decision => decision,
        },
        // "/dashboardx" is not a dashboard path
        _ => GuardDecision::Redirect(Route::Login),
    }
}
