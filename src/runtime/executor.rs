//! Transfer runtime executor

use super::traits::{OperatorPrompt, Pacer};
use async_trait::async_trait;
use crate::journal::{Level, LogSink};
use crate::provider::MessagingClient;
use crate::session::{SessionController, SessionError};
use crate::transfer::{
    transition, Effect, Event, InviteFailure, TransferContext, TransferError, TransferResult,
    TransferState, TransitionError,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Generic transfer runtime that can work with any client, prompt and pacer
pub struct TransferRuntime<C, P, W>
where
    C: MessagingClient,
    P: OperatorPrompt,
    W: Pacer,
{
    context: TransferContext,
    state: TransferState,
    session: SessionController<C>,
    prompt: P,
    pacer: W,
    sink: Arc<dyn LogSink>,
    /// Checked between steps, never during a provider call
    cancel: CancellationToken,
}

impl<C, P, W> TransferRuntime<C, P, W>
where
    C: MessagingClient,
    P: OperatorPrompt,
    W: Pacer,
{
    pub fn new(
        context: TransferContext,
        client: C,
        prompt: P,
        pacer: W,
        sink: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            context,
            state: TransferState::Idle,
            session: SessionController::new(client),
            prompt,
            pacer,
            sink,
            cancel,
        }
    }

    /// Drive one run to a terminal state
    pub async fn run(mut self) -> Result<TransferResult, TransferError> {
        tracing::info!("Starting transfer runtime");

        // Process events in a loop - no recursion
        let mut events = VecDeque::from([Event::Start]);
        while let Some(event) = events.pop_front() {
            let result = match transition(&self.state, &self.context, event) {
                Ok(r) => r,
                Err(TransitionError::Input(e)) => {
                    self.sink.record(Level::Error, &e.to_string());
                    return Err(TransferError::Input(e));
                }
                Err(e) => {
                    tracing::error!(error = %e, state = self.state.name(), "Transition failed");
                    self.sink.record(Level::Error, &e.to_string());
                    self.close_session().await;
                    return Err(TransferError::Interrupted(e.to_string()));
                }
            };

            let old_state = std::mem::replace(&mut self.state, result.new_state);
            if old_state.name() != self.state.name() {
                tracing::debug!(from = old_state.name(), to = self.state.name(), "State change");
            }

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(effect).await {
                    events.push_back(generated);
                }
            }
        }

        tracing::info!(state = self.state.name(), "Transfer runtime stopped");
        match std::mem::take(&mut self.state) {
            TransferState::Done { result } => Ok(result),
            TransferState::Aborted { error } => Err(error),
            other => {
                // No pending events outside a terminal state means an effect
                // produced nothing to continue with.
                self.close_session().await;
                Err(TransferError::Interrupted(format!(
                    "stopped in state {}",
                    other.name()
                )))
            }
        }
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Log { level, message } => {
                self.sink.record(level, &message);
                None
            }

            Effect::Authenticate { credentials } => {
                let prompt = CancellablePrompt {
                    inner: &self.prompt,
                    cancel: &self.cancel,
                };
                let outcome = self.session.authenticate(&credentials, &prompt).await;
                // An abandoned code prompt surfaces as an auth error
                if self.cancel.is_cancelled() {
                    return Some(Event::Cancelled);
                }
                match outcome {
                    Ok(()) => Some(Event::Authenticated),
                    Err(e) => Some(Event::AuthFailed {
                        message: e.to_string(),
                    }),
                }
            }

            Effect::FetchMembers { group } => {
                let outcome = self.session.list_members(&group).await;
                if self.cancel.is_cancelled() {
                    return Some(Event::Cancelled);
                }
                match outcome {
                    Ok(members) => Some(Event::MembersFetched { members }),
                    Err(e) => Some(Event::FetchFailed {
                        message: e.to_string(),
                    }),
                }
            }

            Effect::Invite { group, member } => {
                if self.cancel.is_cancelled() {
                    return Some(Event::Cancelled);
                }
                match self.session.invite(&group, &member).await {
                    Ok(()) => Some(Event::InviteSucceeded),
                    Err(e) => {
                        let message = e.to_string();
                        let failure = match e {
                            SessionError::PrivacyRestricted => InviteFailure::PrivacyRestricted,
                            SessionError::RateLimited { retry_after } => {
                                if let Some(wait) = retry_after {
                                    tracing::warn!(
                                        retry_after_secs = wait.as_secs(),
                                        "Provider asked to back off"
                                    );
                                }
                                InviteFailure::RateLimited
                            }
                            SessionError::Lookup { .. } => InviteFailure::TargetUnresolved(message),
                            _ => InviteFailure::Other(message),
                        };
                        Some(Event::InviteFailed { failure })
                    }
                }
            }

            Effect::Cooldown { delay } => {
                if self.pacer.wait(delay, &self.cancel).await {
                    Some(Event::CooldownElapsed)
                } else {
                    Some(Event::Cancelled)
                }
            }

            Effect::CloseSession => {
                self.close_session().await;
                None
            }
        }
    }

    /// Best-effort disconnect; failures are logged, never propagated
    async fn close_session(&mut self) {
        if let Err(e) = self.session.close().await {
            self.sink
                .record(Level::Warning, &format!("Error closing session: {e}"));
        }
    }
}

/// Operator prompt that gives up as soon as the run is cancelled
struct CancellablePrompt<'a, P> {
    inner: &'a P,
    cancel: &'a CancellationToken,
}

#[async_trait]
impl<'a, P: OperatorPrompt> OperatorPrompt for CancellablePrompt<'a, P> {
    async fn request_input(&self, prompt: &str) -> Option<String> {
        tokio::select! {
            answer = self.inner.request_input(prompt) => answer,
            () = self.cancel.cancelled() => None,
        }
    }
}
