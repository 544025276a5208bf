//! Messaging provider abstraction
//!
//! The transfer never speaks the provider protocol itself. Everything goes
//! through [`MessagingClient`], which a bridge adapter or a test double
//! implements.

mod bridge;
mod error;
mod types;

pub use bridge::BridgeClient;
pub use error::{ProviderError, ProviderErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Operations the workflow needs from the provider client
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Open the connection, reusing a stored session if the client has one
    async fn connect(&self, credentials: &Credentials) -> Result<(), ProviderError>;

    /// Whether the connected session is already signed in
    async fn is_authorized(&self) -> Result<bool, ProviderError>;

    /// Ask the provider to send a one-time login code to `phone`
    async fn send_code(&self, phone: &str) -> Result<LoginToken, ProviderError>;

    /// Complete sign-in with the code the operator received
    async fn sign_in(&self, phone: &str, token: &LoginToken, code: &str)
        -> Result<(), ProviderError>;

    /// Resolve an operator-supplied reference into a group entity
    async fn resolve_group(&self, group: &GroupRef) -> Result<GroupEntity, ProviderError>;

    /// Every participant of `group`, in provider order
    async fn participants(&self, group: &GroupEntity) -> Result<Vec<Member>, ProviderError>;

    /// Invite one member into `group`
    async fn invite(&self, group: &GroupEntity, member: &Member) -> Result<(), ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;
}

#[async_trait]
impl<T: MessagingClient + ?Sized> MessagingClient for Arc<T> {
    async fn connect(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        (**self).connect(credentials).await
    }

    async fn is_authorized(&self) -> Result<bool, ProviderError> {
        (**self).is_authorized().await
    }

    async fn send_code(&self, phone: &str) -> Result<LoginToken, ProviderError> {
        (**self).send_code(phone).await
    }

    async fn sign_in(
        &self,
        phone: &str,
        token: &LoginToken,
        code: &str,
    ) -> Result<(), ProviderError> {
        (**self).sign_in(phone, token, code).await
    }

    async fn resolve_group(&self, group: &GroupRef) -> Result<GroupEntity, ProviderError> {
        (**self).resolve_group(group).await
    }

    async fn participants(&self, group: &GroupEntity) -> Result<Vec<Member>, ProviderError> {
        (**self).participants(group).await
    }

    async fn invite(&self, group: &GroupEntity, member: &Member) -> Result<(), ProviderError> {
        (**self).invite(group, member).await
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        (**self).disconnect().await
    }
}

/// Tracing wrapper for messaging clients
pub struct LoggingClient<C> {
    inner: C,
}

impl<C: MessagingClient> LoggingClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    fn trace<T>(operation: &'static str, started: Instant, result: &Result<T, ProviderError>) {
        let duration_ms = started.elapsed().as_millis();
        match result {
            Ok(_) => tracing::debug!(operation, %duration_ms, "provider call completed"),
            Err(e) => tracing::warn!(
                operation,
                %duration_ms,
                kind = ?e.kind,
                error = %e.message,
                "provider call failed"
            ),
        }
    }
}

#[async_trait]
impl<C: MessagingClient> MessagingClient for LoggingClient<C> {
    async fn connect(&self, credentials: &Credentials) -> Result<(), ProviderError> {
        let started = Instant::now();
        let result = self.inner.connect(credentials).await;
        Self::trace("connect", started, &result);
        result
    }

    async fn is_authorized(&self) -> Result<bool, ProviderError> {
        let started = Instant::now();
        let result = self.inner.is_authorized().await;
        Self::trace("is_authorized", started, &result);
        result
    }

    async fn send_code(&self, phone: &str) -> Result<LoginToken, ProviderError> {
        let started = Instant::now();
        let result = self.inner.send_code(phone).await;
        Self::trace("send_code", started, &result);
        result
    }

    async fn sign_in(
        &self,
        phone: &str,
        token: &LoginToken,
        code: &str,
    ) -> Result<(), ProviderError> {
        let started = Instant::now();
        let result = self.inner.sign_in(phone, token, code).await;
        Self::trace("sign_in", started, &result);
        result
    }

    async fn resolve_group(&self, group: &GroupRef) -> Result<GroupEntity, ProviderError> {
        let started = Instant::now();
        let result = self.inner.resolve_group(group).await;
        Self::trace("resolve_group", started, &result);
        result
    }

    async fn participants(&self, group: &GroupEntity) -> Result<Vec<Member>, ProviderError> {
        let started = Instant::now();
        let result = self.inner.participants(group).await;
        if let Ok(members) = &result {
            tracing::debug!(group_id = group.id, count = members.len(), "participants listed");
        }
        Self::trace("participants", started, &result);
        result
    }

    async fn invite(&self, group: &GroupEntity, member: &Member) -> Result<(), ProviderError> {
        let started = Instant::now();
        let result = self.inner.invite(group, member).await;
        Self::trace("invite", started, &result);
        result
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        let started = Instant::now();
        let result = self.inner.disconnect().await;
        Self::trace("disconnect", started, &result);
        result
    }
}
