//! Typed contract for the `/api/auth` endpoints.
//!
//! Each endpoint has an explicit request and response type; a success body
//! that does not match its type is rejected with
//! [`RequestError::UnexpectedShape`] instead of being read field-by-field.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use callboard_core::UserProfile;

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};

/// Request payload for `POST /api/auth/register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    /// Sign-in email address.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Phone number used for verification.
    pub phone: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Response from `POST /api/auth/register`.
///
/// A token is present only when the account is usable immediately; without
/// one the account awaits administrative approval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResponse {
    /// Whether the backend accepted the registration.
    pub success: bool,
    /// Session token for immediately usable accounts.
    #[serde(default)]
    pub token: Option<String>,
    /// Human-readable notice, typically the pending-approval message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Request payload for `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    /// Sign-in email address.
    pub email: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response from `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Whether the credentials were accepted.
    pub success: bool,
    /// Session token.
    #[serde(default)]
    pub token: Option<String>,
    /// Optional backend message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope of `GET /api/auth/me`.
#[derive(Debug, Deserialize)]
struct MeResponse {
    data: UserProfile,
}

/// Request payload for `POST /api/auth/phone/start`.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneStartRequest {
    /// Email of the pending account.
    pub email: String,
    /// Phone number, if it should replace the one given at registration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request payload for `POST /api/auth/phone/verify`.
#[derive(Debug, Clone, Serialize)]
pub struct PhoneVerifyRequest {
    /// Email of the pending account.
    pub email: String,
    /// Code received by SMS.
    pub code: String,
}

/// Acknowledgement returned by the phone verification endpoints.
///
/// The backend defines the exact body; the common fields are typed and the
/// rest is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Ack {
    /// Success flag, when the backend sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Human-readable notice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Authentication endpoints.
///
/// This trait abstracts the backend auth API so the session context can be
/// exercised against a mock.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse>;

    /// Exchange credentials for a session token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse>;

    /// Fetch the profile of the user owning the current credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is not accepted.
    async fn me(&self) -> Result<UserProfile>;

    /// Send a verification code to the phone of a pending account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    async fn start_phone_verification(&self, req: &PhoneStartRequest) -> Result<Ack>;

    /// Confirm a phone verification code.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the code is rejected.
    async fn verify_phone(&self, req: &PhoneVerifyRequest) -> Result<Ack>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse> {
        self.execute(ApiRequest::post("/api/auth/register").json(req)?)
            .await
    }

    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        self.execute(ApiRequest::post("/api/auth/login").json(req)?)
            .await
    }

    async fn me(&self) -> Result<UserProfile> {
        let response: MeResponse = self.execute(ApiRequest::get("/api/auth/me")).await?;
        Ok(response.data)
    }

    async fn start_phone_verification(&self, req: &PhoneStartRequest) -> Result<Ack> {
        self.execute(ApiRequest::post("/api/auth/phone/start").json(req)?)
            .await
    }

    async fn verify_phone(&self, req: &PhoneVerifyRequest) -> Result<Ack> {
        self.execute(ApiRequest::post("/api/auth/phone/verify").json(req)?)
            .await
    }
}

/// A scripted auth API for testing.
///
/// Responses are queued per endpoint and consumed in order; an endpoint with
/// an empty queue fails with a transport error. Every call is recorded by
/// endpoint name.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Default)]
pub struct MockAuthApi {
    register: parking_lot::Mutex<std::collections::VecDeque<Result<RegisterResponse>>>,
    login: parking_lot::Mutex<std::collections::VecDeque<Result<LoginResponse>>>,
    me: parking_lot::Mutex<std::collections::VecDeque<Result<UserProfile>>>,
    phone: parking_lot::Mutex<std::collections::VecDeque<Result<Ack>>>,
    calls: parking_lot::Mutex<Vec<&'static str>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockAuthApi {
    /// Create a mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a register response.
    pub fn push_register(&self, response: Result<RegisterResponse>) {
        self.register.lock().push_back(response);
    }

    /// Queue a login response.
    pub fn push_login(&self, response: Result<LoginResponse>) {
        self.login.lock().push_back(response);
    }

    /// Queue a current-user response.
    pub fn push_me(&self, response: Result<UserProfile>) {
        self.me.lock().push_back(response);
    }

    /// Queue a response shared by both phone verification endpoints.
    pub fn push_phone(&self, response: Result<Ack>) {
        self.phone.lock().push_back(response);
    }

    /// Endpoint names called so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn next<T>(
        &self,
        name: &'static str,
        queue: &parking_lot::Mutex<std::collections::VecDeque<Result<T>>>,
    ) -> Result<T> {
        self.calls.lock().push(name);
        queue.lock().pop_front().unwrap_or_else(|| {
            Err(crate::RequestError::Transport(format!(
                "no scripted response for {name}"
            )))
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl AuthApi for MockAuthApi {
    async fn register(&self, _req: &RegisterRequest) -> Result<RegisterResponse> {
        self.next("register", &self.register)
    }

    async fn login(&self, _req: &LoginRequest) -> Result<LoginResponse> {
        self.next("login", &self.login)
    }

    async fn me(&self) -> Result<UserProfile> {
        self.next("me", &self.me)
    }

    async fn start_phone_verification(&self, _req: &PhoneStartRequest) -> Result<Ack> {
        self.next("phone_start", &self.phone)
    }

    async fn verify_phone(&self, _req: &PhoneVerifyRequest) -> Result<Ack> {
        self.next("phone_verify", &self.phone)
    }
}
