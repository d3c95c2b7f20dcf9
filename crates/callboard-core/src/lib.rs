//! Core types and utilities for callboard.
//!
//! This crate provides the foundational types shared by the HTTP client, the
//! session context and the command-line front end:
//!
//! - **Identifiers**: [`UserId`], tolerant of numeric and string backend IDs
//! - **Roles**: the ordered [`Role`] hierarchy and account [`UserStatus`]
//! - **Profiles**: the [`UserProfile`] resolved for the current session
//! - **Access rules**: predicates in [`access`] built on the role hierarchy
//!
//! # Example
//!
//! ```
//! use callboard_core::{Role, UserProfile};
//!
//! let json = r#"{"id": 1, "email": "a@b.com", "role": "ADMIN"}"#;
//! let profile: UserProfile = serde_json::from_str(json).unwrap();
//!
//! assert!(profile.role.satisfies(Role::Admin));
//! assert!(!profile.role.satisfies(Role::SuperAdmin));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod error;
pub mod ids;
pub mod role;
pub mod user;

pub use error::{CoreError, Result};
pub use ids::UserId;
pub use role::{Role, UserStatus};
pub use user::UserProfile;
