//! Session controller
//!
//! Owns the provider client for one run: signs in (asking the operator for
//! a one-time code when the client has no stored session), resolves group
//! references once, and classifies provider failures for the invite policy.

use crate::provider::{
    Credentials, GroupEntity, GroupRef, Member, MessagingClient, ProviderError, ProviderErrorKind,
};
use crate::runtime::OperatorPrompt;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const CODE_PROMPT: &str = "Enter the code sent to your phone:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    Auth(String),
    #[error("group {group} could not be resolved: {message}")]
    Lookup { group: String, message: String },
    #[error("user privacy settings prevent the invite")]
    PrivacyRestricted,
    #[error("rate limit reached")]
    RateLimited { retry_after: Option<Duration> },
    #[error("{0}")]
    Other(String),
    #[error("session is not authenticated")]
    NotAuthenticated,
}

impl SessionError {
    fn lookup(group: &GroupRef, error: &ProviderError) -> Self {
        SessionError::Lookup {
            group: group.to_string(),
            message: error.message.clone(),
        }
    }
}

/// One run's connection to the provider
pub struct SessionController<C: MessagingClient> {
    client: C,
    authenticated: bool,
    connected: bool,
    groups: HashMap<GroupRef, GroupEntity>,
}

impl<C: MessagingClient> SessionController<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            authenticated: false,
            connected: false,
            groups: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Connect and sign in. Any failure is an authentication error.
    pub async fn authenticate(
        &mut self,
        credentials: &Credentials,
        prompt: &dyn OperatorPrompt,
    ) -> Result<(), SessionError> {
        // A failed connect may still leave bridge state behind; close anyway.
        self.connected = true;
        self.client
            .connect(credentials)
            .await
            .map_err(|e| SessionError::Auth(e.message))?;

        let authorized = self
            .client
            .is_authorized()
            .await
            .map_err(|e| SessionError::Auth(e.message))?;

        if !authorized {
            let token = self
                .client
                .send_code(&credentials.phone)
                .await
                .map_err(|e| SessionError::Auth(e.message))?;

            let code = prompt
                .request_input(CODE_PROMPT)
                .await
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or_else(|| SessionError::Auth("no verification code entered".to_string()))?;

            self.client
                .sign_in(&credentials.phone, &token, &code)
                .await
                .map_err(|e| SessionError::Auth(e.message))?;
        }

        self.authenticated = true;
        Ok(())
    }

    async fn resolve(&mut self, group: &GroupRef) -> Result<GroupEntity, SessionError> {
        if let Some(entity) = self.groups.get(group) {
            return Ok(entity.clone());
        }
        let entity = self
            .client
            .resolve_group(group)
            .await
            .map_err(|e| SessionError::lookup(group, &e))?;
        tracing::debug!(
            group = %group,
            id = entity.id,
            title = entity.title.as_deref().unwrap_or_default(),
            "Group resolved"
        );
        self.groups.insert(group.clone(), entity.clone());
        Ok(entity)
    }

    /// Every member of `group`, in provider order
    pub async fn list_members(&mut self, group: &GroupRef) -> Result<Vec<Member>, SessionError> {
        if !self.authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        let entity = self.resolve(group).await?;
        self.client
            .participants(&entity)
            .await
            .map_err(|e| SessionError::lookup(group, &e))
    }

    /// Invite one member into `group`
    pub async fn invite(&mut self, group: &GroupRef, member: &Member) -> Result<(), SessionError> {
        if !self.authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        let entity = self.resolve(group).await?;
        self.client
            .invite(&entity, member)
            .await
            .map_err(|e| match e.kind {
                ProviderErrorKind::PrivacyRestricted => SessionError::PrivacyRestricted,
                ProviderErrorKind::RateLimit => SessionError::RateLimited {
                    retry_after: e.retry_after,
                },
                _ => SessionError::Other(e.message),
            })
    }

    /// Disconnect if connected. Idempotent.
    pub async fn close(&mut self) -> Result<(), ProviderError> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;
        self.authenticated = false;
        self.groups.clear();
        self.client.disconnect().await
    }
}
