//! The session context.
//!
//! [`SessionContext`] is the single owner of the session token. It reads the
//! persisted token at start, resolves it against the backend, and publishes
//! every state change through a `watch` channel so views can follow along.
//!
//! Each resolve, login and registration starts a new epoch; logout and a
//! rejected token start one as well. A network result is only committed if
//! its epoch is still current, so a logout issued while a login is in flight
//! wins over the login.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use callboard_client::{
    Ack, ApiClient, AuthApi, DurableStore, LoginRequest, PhoneStartRequest, PhoneVerifyRequest,
    RequestError, StoreError, AUTH_TOKEN_KEY,
};
use callboard_core::{Role, UserProfile};

use crate::result::{AuthResult, Registration, PENDING_APPROVAL_MESSAGE};
use crate::state::{is_valid_transition, Session, SessionState};

/// Failure reported when the backend does not hand out a token on login.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Failure reported when the backend rejects a registration without a message.
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed";

/// Failure reported when a logout or a newer sign-in overtook this one.
pub const SESSION_CHANGED_MESSAGE: &str = "Session changed before sign-in completed";

/// Owns the current session and coordinates the auth API with durable
/// storage.
///
/// All operations take `&self`; share the context behind an `Arc` when
/// several tasks need it. Auth operations never return errors: they report
/// an [`AuthResult`] and leave the session in a consistent state.
pub struct SessionContext<A: AuthApi = ApiClient> {
    api: A,
    store: Arc<dyn DurableStore>,
    state: watch::Sender<Session>,
    epoch: AtomicU64,
}

impl<A: AuthApi> std::fmt::Debug for SessionContext<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionContext<ApiClient> {
    /// Create a context over the client's own credential store.
    ///
    /// Prefer this to [`new`](Self::new) so the token the context persists
    /// is the one the client sends.
    #[must_use]
    pub fn for_client(api: ApiClient) -> Self {
        let store = Arc::clone(api.store());
        Self::new(api, store)
    }

    /// [`for_client`](Self::for_client) followed by [`resolve`](Self::resolve).
    pub async fn connect(api: ApiClient) -> Self {
        let ctx = Self::for_client(api);
        ctx.resolve().await;
        ctx
    }
}

impl<A: AuthApi> SessionContext<A> {
    /// Create a context in the `Resolving` state.
    ///
    /// The persisted token is read immediately; call [`resolve`](Self::resolve)
    /// to validate it. An unreadable store is treated as holding no token.
    /// `store` must be the store `api` reads credentials from.
    #[must_use]
    pub fn new(api: A, store: Arc<dyn DurableStore>) -> Self {
        let token = match store.get(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session token");
                None
            }
        };
        let (state, _) = watch::channel(Session::resolving(token));
        Self {
            api,
            store,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    /// Create a context and resolve the persisted token.
    pub async fn start(api: A, store: Arc<dyn DurableStore>) -> Self {
        let ctx = Self::new(api, store);
        ctx.resolve().await;
        ctx
    }

    /// Validate the persisted token against the backend.
    ///
    /// Without a token the session becomes `Anonymous` without a network
    /// call. A rejected token, or any other failure fetching the profile,
    /// removes the token and leaves the session `Anonymous`. Returns the
    /// state after the call, which reflects any logout that overtook it.
    pub async fn resolve(&self) -> SessionState {
        let epoch = self.begin();
        let token = self.state.borrow().token.clone();

        let Some(token) = token else {
            tracing::debug!("No persisted session token");
            self.commit(epoch, Session::anonymous());
            return self.state();
        };

        self.set_loading(epoch, true);
        match self.api.me().await {
            Ok(user) => {
                let (user_id, role) = (user.id.clone(), user.role);
                if self.commit(epoch, Session::authenticated(token, user)) {
                    tracing::info!(user_id = %user_id, role = %role, "Session resolved");
                } else {
                    tracing::debug!("Discarding superseded session resolution");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session token rejected");
                self.clear_if_current(epoch);
            }
        }
        self.state()
    }

    /// Exchange credentials for a session.
    ///
    /// The token is persisted before the profile fetch so that the fetch
    /// carries it. If the profile cannot be fetched the token is removed
    /// again and the result is a failure.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult {
        tracing::debug!(email = %email, "Logging in");

        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let epoch = self.begin();
        self.set_loading(epoch, true);
        let response = match self.api.login(&req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(email = %email, error = %e, "Login request failed");
                self.set_loading(epoch, false);
                return AuthResult::failure(e.message());
            }
        };

        match response.token {
            Some(token) if response.success && !token.is_empty() => {
                self.establish(epoch, token).await
            }
            _ => {
                tracing::warn!(email = %email, "Login response carried no token");
                self.set_loading(epoch, false);
                AuthResult::failure(LOGIN_FAILED_MESSAGE)
            }
        }
    }

    /// Register a new account.
    ///
    /// Input is validated locally first; invalid input fails without a
    /// network call. An account that is usable immediately is signed in.
    /// One that awaits approval yields [`AuthResult::Pending`] and leaves the
    /// session untouched.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        phone: &str,
    ) -> AuthResult {
        let registration = match Registration::new(email, password, name, phone) {
            Ok(registration) => registration,
            Err(e) => {
                tracing::debug!(error = %e, "Registration input rejected");
                return AuthResult::failure(e.to_string());
            }
        };
        self.submit_registration(&registration).await
    }

    /// Register with already validated input.
    pub async fn submit_registration(&self, registration: &Registration) -> AuthResult {
        tracing::debug!(email = %registration.email(), "Registering");

        let epoch = self.begin();
        self.set_loading(epoch, true);
        let response = match self.api.register(&registration.to_request()).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    email = %registration.email(),
                    error = %e,
                    "Registration request failed"
                );
                self.set_loading(epoch, false);
                return AuthResult::failure(e.message());
            }
        };

        if !response.success {
            self.set_loading(epoch, false);
            return AuthResult::failure(
                response
                    .message
                    .unwrap_or_else(|| REGISTRATION_FAILED_MESSAGE.to_string()),
            );
        }

        match response.token {
            Some(token) if !token.is_empty() => self.establish(epoch, token).await,
            _ => {
                tracing::info!(email = %registration.email(), "Registration pending approval");
                self.set_loading(epoch, false);
                AuthResult::Pending {
                    message: response
                        .message
                        .unwrap_or_else(|| PENDING_APPROVAL_MESSAGE.to_string()),
                }
            }
        }
    }

    /// Ask the backend to text a verification code to a pending account.
    ///
    /// Leaves the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns the request error unchanged.
    pub async fn start_phone_verification(
        &self,
        email: &str,
        phone: Option<&str>,
    ) -> Result<Ack, RequestError> {
        let req = PhoneStartRequest {
            email: email.to_string(),
            phone: phone.map(str::to_string),
        };
        self.api.start_phone_verification(&req).await
    }

    /// Confirm a phone verification code.
    ///
    /// Leaves the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns the request error unchanged.
    pub async fn verify_phone(&self, email: &str, code: &str) -> Result<Ack, RequestError> {
        let req = PhoneVerifyRequest {
            email: email.to_string(),
            code: code.to_string(),
        };
        self.api.verify_phone(&req).await
    }

    /// End the session.
    ///
    /// Safe to call in any state; calling it twice has the same effect as
    /// calling it once. Sign-ins still in flight are discarded.
    pub fn logout(&self) {
        if self.clear() {
            tracing::info!("Logged out");
        }
    }

    /// Re-fetch the current user's profile.
    ///
    /// Does nothing without a token. A failure ends the session unless a
    /// logout or a new sign-in happened meanwhile.
    pub async fn refresh_profile(&self) -> SessionState {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let token = self.state.borrow().token.clone();
        let Some(token) = token else {
            return self.state();
        };

        match self.api.me().await {
            Ok(user) => {
                let user_id = user.id.clone();
                if self.commit(epoch, Session::authenticated(token, user)) {
                    tracing::debug!(user_id = %user_id, "Profile refreshed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile refresh failed, ending session");
                self.clear_if_current(epoch);
            }
        }
        self.state()
    }

    /// Pass a resource call result through, ending the session if the
    /// backend rejected the credentials with HTTP 401.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error unchanged.
    pub fn track<T>(&self, result: Result<T, RequestError>) -> Result<T, RequestError> {
        if let Err(e) = &result {
            if e.is_unauthorized() && self.snapshot().token.is_some() {
                tracing::warn!(error = %e, "Credentials rejected, ending session");
                self.clear();
            }
        }
        result
    }

    /// Returns `true` if the current user is at least an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns `true` if the current user is a super admin.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SuperAdmin)
    }

    /// Returns `true` if the current user's role is at least `required`.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.state.borrow().has_role(required)
    }

    /// Returns `true` if a user is resolved.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// A copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// The current coarse state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().state()
    }

    /// The resolved user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.state.borrow().user.clone()
    }

    /// Subscribe to session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Wait until the persisted token has been resolved.
    pub async fn wait_resolved(&self) -> Session {
        let mut rx = self.state.subscribe();
        let resolved = rx.wait_for(|s| s.resolved).await.map(|s| s.clone());
        resolved.unwrap_or_else(|_| self.snapshot())
    }

    /// The underlying auth API.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    async fn establish(&self, epoch: u64, token: String) -> AuthResult {
        match self.persist_token(epoch, &token) {
            Ok(true) => {}
            Ok(false) => return AuthResult::failure(SESSION_CHANGED_MESSAGE),
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist session token");
                self.set_loading(epoch, false);
                return AuthResult::failure(e.to_string());
            }
        }

        match self.api.me().await {
            Ok(user) => {
                let (user_id, role) = (user.id.clone(), user.role);
                if self.commit(epoch, Session::authenticated(token, user)) {
                    tracing::info!(user_id = %user_id, role = %role, "Signed in");
                    AuthResult::Authenticated
                } else {
                    tracing::info!(user_id = %user_id, "Discarding superseded sign-in");
                    AuthResult::failure(SESSION_CHANGED_MESSAGE)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch after sign-in failed");
                self.clear_if_current(epoch);
                AuthResult::failure(e.message())
            }
        }
    }

    /// Start a new epoch, superseding every operation in flight.
    fn begin(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `next` if `epoch` is still current.
    ///
    /// The epoch check runs under the channel's write lock, the same lock
    /// [`clear`](Self::clear) holds while it advances the epoch.
    fn commit(&self, epoch: u64, next: Session) -> bool {
        let mut committed = false;
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            committed = true;
            Self::apply(s, next)
        });
        committed
    }

    fn persist_token(&self, epoch: u64, token: &str) -> Result<bool, StoreError> {
        let mut outcome = Ok(false);
        self.state.send_if_modified(|_| {
            if self.epoch.load(Ordering::SeqCst) == epoch {
                outcome = self.store.set(AUTH_TOKEN_KEY, token).map(|()| true);
            }
            false
        });
        outcome
    }

    /// Drop the token and end the session, superseding every operation in
    /// flight. Returns `true` if the session changed.
    fn clear(&self) -> bool {
        self.state.send_if_modified(|s| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.remove_token();
            Self::apply(s, Session::anonymous())
        })
    }

    fn clear_if_current(&self, epoch: u64) {
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            self.remove_token();
            Self::apply(s, Session::anonymous())
        });
    }

    fn remove_token(&self) {
        if let Err(e) = self.store.remove(AUTH_TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to remove session token");
        }
    }

    fn set_loading(&self, epoch: u64, loading: bool) {
        self.state.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            let next = Session {
                loading,
                ..s.clone()
            };
            Self::apply(s, next)
        });
    }

    /// Replace `current` with `next`, checking the state machine.
    fn apply(current: &mut Session, next: Session) -> bool {
        if *current == next {
            return false;
        }
        let (from, to) = (current.state(), next.state());
        debug_assert!(
            (from == SessionState::Resolving && to == from) || is_valid_transition(from, to),
            "invalid session transition {from:?} -> {to:?}"
        );
        if from != to {
            tracing::debug!(from = from.as_str(), to = to.as_str(), "Session transition");
        }
        *current = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use callboard_client::{LoginResponse, MemoryStore, MockAuthApi, RegisterResponse};
    use callboard_core::UserId;

    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: UserId::from(1),
            email: "a@b.com".to_string(),
            name: Some("Ada".to_string()),
            role,
            status: None,
        }
    }

    fn login_ok(token: &str) -> LoginResponse {
        LoginResponse {
            success: true,
            token: Some(token.to_string()),
            message: None,
        }
    }

    fn unauthorized(message: &str) -> RequestError {
        RequestError::Api {
            status: 401,
            message: message.to_string(),
        }
    }

    fn store_with_token(token: &str) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, token)]))
    }

    #[tokio::test]
    async fn starts_resolving_with_persisted_token() {
        let ctx = SessionContext::new(MockAuthApi::new(), store_with_token("T1"));
        let session = ctx.snapshot();
        assert_eq!(session.state(), SessionState::Resolving);
        assert_eq!(session.token.as_deref(), Some("T1"));
        assert!(session.loading);
    }

    #[tokio::test]
    async fn resolve_without_token_skips_network() {
        let ctx = SessionContext::start(MockAuthApi::new(), Arc::new(MemoryStore::new())).await;
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(!ctx.snapshot().loading);
        assert!(ctx.api().calls().is_empty());
    }

    #[tokio::test]
    async fn resolve_with_valid_token_authenticates() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));
        let store = store_with_token("T1");

        let ctx = SessionContext::start(api, store.clone()).await;

        assert_eq!(ctx.state(), SessionState::Authenticated);
        assert_eq!(ctx.snapshot().token.as_deref(), Some("T1"));
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn resolve_with_rejected_token_clears_it() {
        let api = MockAuthApi::new();
        api.push_me(Err(unauthorized("Token expired")));
        let store = store_with_token("T1");

        let ctx = SessionContext::start(api, store.clone()).await;

        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(ctx.snapshot().token.is_none());
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn login_persists_token_and_user() {
        let api = MockAuthApi::new();
        api.push_login(Ok(login_ok("T1")));
        api.push_me(Ok(profile(Role::User)));
        let store = Arc::new(MemoryStore::new());

        let ctx = SessionContext::start(api, store.clone()).await;
        let result = ctx.login("a@b.com", "pw").await;

        assert_eq!(result, AuthResult::Authenticated);
        assert_eq!(ctx.user().map(|u| u.role), Some(Role::User));
        assert!(!ctx.is_admin());
        assert!(!ctx.snapshot().loading);
        assert_eq!(store.get(AUTH_TOKEN_KEY).unwrap().as_deref(), Some("T1"));
        assert_eq!(ctx.api().calls(), vec!["login", "me"]);
    }

    #[tokio::test]
    async fn login_without_token_fails() {
        let api = MockAuthApi::new();
        api.push_login(Ok(LoginResponse {
            success: true,
            token: None,
            message: None,
        }));

        let ctx = SessionContext::start(api, Arc::new(MemoryStore::new())).await;
        let result = ctx.login("a@b.com", "pw").await;

        assert_eq!(result.error(), Some(LOGIN_FAILED_MESSAGE));
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(!ctx.snapshot().loading);
    }

    #[tokio::test]
    async fn login_error_surfaces_backend_message() {
        let api = MockAuthApi::new();
        api.push_login(Err(unauthorized("Invalid credentials")));

        let ctx = SessionContext::start(api, Arc::new(MemoryStore::new())).await;
        let result = ctx.login("a@b.com", "bad").await;

        assert_eq!(result.error(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn login_with_failed_profile_fetch_clears_token() {
        let api = MockAuthApi::new();
        api.push_login(Ok(login_ok("T1")));
        api.push_me(Err(RequestError::Transport("connection reset".to_string())));
        let store = Arc::new(MemoryStore::new());

        let ctx = SessionContext::start(api, store.clone()).await;
        let result = ctx.login("a@b.com", "pw").await;

        assert!(!result.is_success());
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn register_pending_leaves_session_anonymous() {
        let api = MockAuthApi::new();
        api.push_register(Ok(RegisterResponse {
            success: true,
            token: None,
            message: None,
        }));
        let store = Arc::new(MemoryStore::new());

        let ctx = SessionContext::start(api, store.clone()).await;
        let result = ctx.register("a@b.com", "pw", "Ada", "+15550100").await;

        assert_eq!(
            result,
            AuthResult::Pending {
                message: PENDING_APPROVAL_MESSAGE.to_string()
            }
        );
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn register_with_token_signs_in() {
        let api = MockAuthApi::new();
        api.push_register(Ok(RegisterResponse {
            success: true,
            token: Some("T2".to_string()),
            message: None,
        }));
        api.push_me(Ok(profile(Role::User)));

        let ctx = SessionContext::start(api, Arc::new(MemoryStore::new())).await;
        let result = ctx.register("a@b.com", "pw", "Ada", "+15550100").await;

        assert_eq!(result, AuthResult::Authenticated);
        assert_eq!(ctx.snapshot().token.as_deref(), Some("T2"));
    }

    #[tokio::test]
    async fn register_rejected_uses_fallback_message() {
        let api = MockAuthApi::new();
        api.push_register(Ok(RegisterResponse {
            success: false,
            token: None,
            message: None,
        }));

        let ctx = SessionContext::start(api, Arc::new(MemoryStore::new())).await;
        let result = ctx.register("a@b.com", "pw", "Ada", "+15550100").await;

        assert_eq!(result.error(), Some(REGISTRATION_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn register_validates_before_calling_backend() {
        let ctx = SessionContext::start(MockAuthApi::new(), Arc::new(MemoryStore::new())).await;

        let result = ctx.register("a@b.com", "pw", "", "+15550100").await;
        assert_eq!(result.error(), Some("Name is required for registration"));

        let result = ctx.register("a@b.com", "pw", "Ada", "  ").await;
        assert_eq!(result.error(), Some("Phone is required for registration"));

        assert!(ctx.api().calls().is_empty());
    }

    #[tokio::test]
    async fn phone_verification_does_not_touch_session() {
        let api = MockAuthApi::new();
        api.push_phone(Ok(Ack::default()));
        api.push_phone(Err(RequestError::Api {
            status: 400,
            message: "Invalid code".to_string(),
        }));

        let ctx = SessionContext::start(api, Arc::new(MemoryStore::new())).await;
        let before = ctx.snapshot();

        assert!(ctx.start_phone_verification("a@b.com", None).await.is_ok());
        let err = ctx.verify_phone("a@b.com", "000000").await.unwrap_err();
        assert_eq!(err.message(), "Invalid code");

        assert_eq!(ctx.snapshot(), before);
        assert_eq!(ctx.api().calls(), vec!["phone_start", "phone_verify"]);
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::Admin)));
        let store = store_with_token("T1");

        let ctx = SessionContext::start(api, store.clone()).await;
        assert!(ctx.is_admin());

        ctx.logout();
        let once = ctx.snapshot();
        ctx.logout();

        assert_eq!(ctx.snapshot(), once);
        assert_eq!(once.state(), SessionState::Anonymous);
        assert!(once.token.is_none());
        assert!(!ctx.is_admin());
        assert!(store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_notifies_subscribers_once() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));

        let ctx = SessionContext::start(api, store_with_token("T1")).await;
        let mut rx = ctx.subscribe();
        rx.borrow_and_update();

        ctx.logout();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        ctx.logout();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn refresh_failure_ends_session() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));
        api.push_me(Err(unauthorized("Token expired")));

        let ctx = SessionContext::start(api, store_with_token("T1")).await;
        assert_eq!(ctx.refresh_profile().await, SessionState::Anonymous);
        assert!(ctx.user().is_none());
    }

    #[tokio::test]
    async fn refresh_updates_profile() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));
        api.push_me(Ok(profile(Role::Admin)));

        let ctx = SessionContext::start(api, store_with_token("T1")).await;
        assert!(!ctx.is_admin());
        assert_eq!(ctx.refresh_profile().await, SessionState::Authenticated);
        assert!(ctx.is_admin());
    }

    #[tokio::test]
    async fn track_clears_session_on_unauthorized() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));

        let ctx = SessionContext::start(api, store_with_token("T1")).await;

        let ok: Result<u8, RequestError> = ctx.track(Ok(1));
        assert_eq!(ok.unwrap(), 1);

        let forbidden: Result<(), RequestError> = ctx.track(Err(RequestError::Api {
            status: 403,
            message: "Forbidden".to_string(),
        }));
        assert!(forbidden.is_err());
        assert_eq!(ctx.state(), SessionState::Authenticated);

        let err = ctx
            .track::<()>(Err(unauthorized("Token expired")))
            .unwrap_err();
        assert_eq!(err.message(), "Token expired");
        assert_eq!(ctx.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn role_predicates_follow_hierarchy() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::SuperAdmin)));

        let ctx = SessionContext::start(api, store_with_token("T1")).await;
        assert!(ctx.is_admin());
        assert!(ctx.is_super_admin());
        assert!(ctx.has_role(Role::User));
    }

    #[tokio::test]
    async fn wait_resolved_returns_settled_session() {
        let api = MockAuthApi::new();
        api.push_me(Ok(profile(Role::User)));

        let ctx = Arc::new(SessionContext::new(api, store_with_token("T1")));
        let waiter = {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { ctx.wait_resolved().await })
        };

        ctx.resolve().await;
        let session = waiter.await.unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn logout_supersedes_pending_commit() {
        let api = MockAuthApi::new();
        let ctx = SessionContext::new(api, Arc::new(MemoryStore::new()));
        ctx.resolve().await;

        let epoch = ctx.begin();
        ctx.logout();

        let stale = Session::authenticated("T1".to_string(), profile(Role::User));
        assert!(!ctx.commit(epoch, stale));
        assert_eq!(ctx.state(), SessionState::Anonymous);
        assert!(ctx.persist_token(epoch, "T1").is_ok_and(|persisted| !persisted));
        assert!(ctx.store.get(AUTH_TOKEN_KEY).unwrap().is_none());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "invalid session transition")]
    fn apply_rejects_return_to_resolving() {
        let mut current = Session::authenticated("T1".to_string(), profile(Role::User));
        let next = Session::resolving(Some("T1".to_string()));
        SessionContext::<MockAuthApi>::apply(&mut current, next);
    }
}
