//! Defines the [`SessionId`] type.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of a caller-supplied session ID.
pub const MAX_LEN: usize = 128;

/// Identifies one conversation.
///
/// Server-issued IDs are random v4 UUIDs. Caller-supplied IDs are accepted as
/// long as they are short and only contain ASCII alphanumerics, `-` and `_`,
/// so they are safe to echo back in headers and cookies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && s.len() <= MAX_LEN
            && s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

        if !valid {
            return Err(Error::InvalidSessionId(s.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for SessionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_new_ids_are_unique_and_valid() {
        let a = SessionId::new();
        let b = SessionId::new();

        assert_ne!(a, b);
        assert_eq!(a.as_str().parse::<SessionId>().unwrap(), a);
    }

    #[test]
    fn test_parse_rejects_unsafe_ids() {
        for input in ["", "has space", "semi;colon", "quote\"", "x".repeat(MAX_LEN + 1).as_str()] {
            assert_eq!(
                input.parse::<SessionId>(),
                Err(Error::InvalidSessionId(input.to_owned())),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_accepts_caller_ids() {
        let id: SessionId = "tab-42_a".parse().unwrap();
        assert_eq!(id.to_string(), "tab-42_a");
    }
}
