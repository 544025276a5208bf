//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Provider error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    #[cfg(test)]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Auth, message)
    }

    #[cfg(test)]
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Lookup, message)
    }

    #[cfg(test)]
    pub fn privacy_restricted(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::PrivacyRestricted, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimit, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unknown, message)
    }
}

/// Error classification used by the invite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Timeouts, refused connections
    Network,
    /// Invalid credentials, rejected verification code, expired session
    Auth,
    /// Group not found, not joined, or not permitted
    Lookup,
    /// The member's privacy settings forbid being added
    PrivacyRestricted,
    /// Flood limit hit - stop writing for a while
    RateLimit,
    /// Unknown error
    Unknown,
}
