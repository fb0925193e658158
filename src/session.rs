//! Identity handed over by the authentication provider.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Stable, opaque identifier of an account. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidUserId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in user. The id is trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_user_id() {
        assert!(matches!(UserId::new(""), Err(Error::InvalidUserId)));
        assert!(matches!(UserId::new("   "), Err(Error::InvalidUserId)));
    }

    #[test]
    fn test_user_id_deserialization_is_validated() {
        let id: UserId = serde_json::from_str("\"uid-42\"").unwrap();
        assert_eq!(id.as_str(), "uid-42");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }

    #[test]
    fn test_session_carries_email() {
        let session = Session::new(UserId::new("u1").unwrap()).with_email("a@b.c");
        assert_eq!(session.email.as_deref(), Some("a@b.c"));
        assert_eq!(session.user_id.to_string(), "u1");
    }
}
