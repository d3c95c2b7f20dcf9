//! Identifier types for backend-owned records.
//!
//! The backend is free to key users with integers or opaque strings, so
//! [`UserId`] accepts both on the wire. Numeric strings are normalized to
//! numbers, so `"42"` serializes back as `42`; other strings stay text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of a backend user record.
///
/// Numeric-looking strings are normalized to the numeric form, so
/// `"42".parse::<UserId>()` equals `UserId::from(42)`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawId", into = "RawId")]
pub struct UserId(RawId);

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl UserId {
    /// Return the numeric form, if the backend uses integer keys.
    #[must_use]
    pub const fn as_number(&self) -> Option<i64> {
        match self.0 {
            RawId::Number(n) => Some(n),
            RawId::Text(_) => None,
        }
    }

    /// Render the ID for use inside a URL path segment.
    #[must_use]
    pub fn to_path_segment(&self) -> String {
        self.to_string()
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(RawId::Number(value))
    }
}

impl FromStr for UserId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidUserId("empty".to_string()));
        }
        Ok(trimmed.parse::<i64>().map_or_else(
            |_| Self(RawId::Text(trimmed.to_string())),
            |n| Self(RawId::Number(n)),
        ))
    }
}

impl TryFrom<RawId> for UserId {
    type Error = CoreError;

    fn try_from(raw: RawId) -> Result<Self, Self::Error> {
        match raw {
            RawId::Number(n) => Ok(Self::from(n)),
            RawId::Text(s) => s.parse(),
        }
    }
}

impl From<UserId> for RawId {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({self})")
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            RawId::Number(n) => write!(f, "{n}"),
            RawId::Text(s) => f.write_str(s),
        }
    }
}
