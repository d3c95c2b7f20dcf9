//! Session context and route guards for callboard.
//!
//! This crate owns the answer to "who is signed in, and may they see this
//! view". It coordinates the durable token slot and the backend auth API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Views (CLI commands, screens)               │
//! └─────────────────────────────────────────────────────────────┘
//!          │ login / register / logout          │ snapshot()
//!          ▼                                    ▼
//! ┌─────────────────────────────┐      ┌──────────────────────┐
//! │       SessionContext        │─────▶│   guard::protect     │
//! │  watch::Sender<Session>     │      │   guard::login_gate  │
//! └─────────────────────────────┘      └──────────────────────┘
//!          │                 │
//!          ▼                 ▼
//!   ┌─────────────┐   ┌──────────────┐
//!   │   AuthApi   │   │ DurableStore │
//!   │  (backend)  │   │  authToken   │
//!   └─────────────┘   └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use callboard_client::{ApiClient, ClientConfig, DurableStore, FileStore};
//! use callboard_session::{guard, AuthResult, GuardDecision, SessionContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn DurableStore> = Arc::new(FileStore::new("session.json"));
//! let client = ApiClient::new(ClientConfig::from_env(), store)?;
//! let session = SessionContext::connect(client).await;
//!
//! if guard::protect(&session.snapshot()) != GuardDecision::Render {
//!     match session.login("a@b.com", "pw").await {
//!         AuthResult::Authenticated => println!("signed in"),
//!         AuthResult::Pending { message } => println!("{message}"),
//!         AuthResult::Failure { error } => eprintln!("{error}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # State Machine
//!
//! - `Resolving` → `Authenticated` (stored token accepted) or `Anonymous`
//! - `Anonymous` → `Authenticated` (login, or register with a token)
//! - `Anonymous` → `Anonymous` (register pending approval)
//! - `Authenticated` → `Anonymous` (logout, rejected token)
//!
//! See the [`state`] module for the transition table.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod guard;
pub mod result;
pub mod state;

pub use context::{
    SessionContext, LOGIN_FAILED_MESSAGE, REGISTRATION_FAILED_MESSAGE, SESSION_CHANGED_MESSAGE,
};
pub use guard::{GuardDecision, Route};
pub use result::{AuthResult, Registration, RegistrationError};
pub use state::{Session, SessionState};

// Re-export commonly used types from dependencies for convenience
pub use callboard_core::{Role, UserProfile};
