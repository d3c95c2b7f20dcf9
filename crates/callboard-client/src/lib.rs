//! Authenticated REST client for the callboard backend.
//!
//! This crate is the request layer every dashboard view goes through:
//!
//! - [`ApiClient`] executes one request with uniform credential attachment
//!   and error normalization
//! - [`DurableStore`] is the persistent key-value slot holding the session
//!   token (and an optional API key)
//! - [`AuthApi`] is the typed contract for the `/api/auth` endpoints
//! - [`resources`] holds the pass-through endpoints for agents, calls,
//!   leads, analytics and users
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │  SessionContext  │────▶│     AuthApi      │
//! │  / CLI commands  │     │     (trait)      │
//! └────────┬─────────┘     └────────┬─────────┘
//!          │ resources()            │
//!          ▼                        ▼
//!        ┌────────────────────────────┐      ┌──────────────┐
//!        │         ApiClient          │─────▶│ DurableStore │
//!        │  (credentials, errors)     │ read │ authToken    │
//!        └─────────────┬──────────────┘      │ apiKey       │
//!                      │ HTTP(S)             └──────────────┘
//!              ┌───────▼────────┐
//!              │    Backend     │
//!              └────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use callboard_client::{ApiClient, ClientConfig, MemoryStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let client = ApiClient::new(ClientConfig::from_env(), store)?;
//!
//! let agents = client.agents().list(&[("limit", "20")]).await?;
//! println!("{agents}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod error;
pub mod http;
pub mod resources;
pub mod storage;

use std::time::Duration;

use serde::Deserialize;

pub use auth::{
    Ack, AuthApi, LoginRequest, LoginResponse, PhoneStartRequest, PhoneVerifyRequest,
    RegisterRequest, RegisterResponse,
};
pub use error::{RequestError, Result, GENERIC_ERROR_MESSAGE};
pub use http::{ApiClient, ApiRequest, API_KEY_HEADER};
pub use resources::{SyncReport, UserUpdate};
pub use storage::{DurableStore, FileStore, MemoryStore, StoreError, API_KEY_KEY, AUTH_TOKEN_KEY};

#[cfg(any(test, feature = "test-utils"))]
pub use auth::MockAuthApi;

/// Environment variables consulted for the backend base URL, in order.
pub const BASE_URL_ENV: [&str; 2] = ["CALLBOARD_API_BASE_URL", "CALLBOARD_BACKEND_URL"];

/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "CALLBOARD_REQUEST_TIMEOUT_SECS";

/// Configuration for reaching the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL (e.g., `http://localhost:3000`).
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds; `0` disables the timeout.
    #[serde(default = "ClientConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ClientConfig {
    fn default_base_url() -> String {
        "http://localhost:3000".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    /// Build a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset. An unparsable timeout falls back to the
    /// default and is logged.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = BASE_URL_ENV
            .iter()
            .find_map(|key| non_blank(key))
            .unwrap_or_else(Self::default_base_url);

        let request_timeout_seconds = match non_blank(TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring invalid {TIMEOUT_ENV}");
                Self::default_request_timeout()
            }),
            None => Self::default_request_timeout(),
        };

        Self {
            base_url,
            request_timeout_seconds,
        }
    }

    /// Join the base URL and a relative endpoint.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Get the request timeout as a `Duration`, if one is configured.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_seconds))
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}
