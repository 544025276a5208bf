//! Shared data types for the messaging provider

use std::fmt;

/// Account credentials, supplied once per run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: i32,
    pub api_hash: String,
    pub phone: String,
}

// The api hash is a secret and must not end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Operator-supplied group reference (a public handle or an id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupRef(String);

impl GroupRef {
    /// Build a reference from operator input, dropping a leading `@`
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        Self(trimmed.strip_prefix('@').unwrap_or(trimmed).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-side handle for a resolved group. Opaque to the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntity {
    pub id: i64,
    pub access_hash: Option<i64>,
    pub title: Option<String>,
}

/// One member of a group roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub access_hash: Option<i64>,
    /// Public username. Members without one cannot be invited.
    pub username: Option<String>,
}

impl Member {
    #[cfg(test)]
    pub fn new(id: i64, username: Option<&str>) -> Self {
        Self {
            id,
            access_hash: None,
            username: username.map(str::to_string),
        }
    }

    /// The display handle, if the member has a non-empty one
    pub fn handle(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

/// Token returned by a code request, passed back on sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginToken(pub String);
