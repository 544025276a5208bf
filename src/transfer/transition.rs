//! Pure state transition function
//!
//! Given the same state, context and event this always yields the same new
//! state and effects. All I/O happens in the runtime executor.

use super::error::{InputError, TransferError};
use super::event::InviteFailure;
use super::state::{
    InvitePhase, InviteProgress, TerminationReason, TransferContext, TransferResult,
    TransferState,
};
use super::{Effect, Event};
use crate::provider::Member;
use std::sync::Arc;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TransferState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TransferState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Start rejected; the machine stays idle
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &TransferState,
    context: &TransferContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Start
        // ============================================================
        (TransferState::Idle, Event::Start) => {
            let (credentials, source, target) = context.inputs.validate()?;
            Ok(
                TransitionResult::new(TransferState::Authenticating { source, target })
                    .with_effect(Effect::info("Authenticating Telegram client..."))
                    .with_effect(Effect::Authenticate { credentials }),
            )
        }

        // ============================================================
        // Authentication
        // ============================================================
        (TransferState::Authenticating { source, target }, Event::Authenticated) => Ok(
            TransitionResult::new(TransferState::FetchingMembers {
                source: source.clone(),
                target: target.clone(),
            })
            .with_effect(Effect::info("Successfully authenticated!"))
            .with_effect(Effect::info(format!(
                "Fetching members from the group: {source}"
            )))
            .with_effect(Effect::FetchMembers {
                group: source.clone(),
            }),
        ),

        (TransferState::Authenticating { .. }, Event::AuthFailed { message }) => Ok(abort(
            format!("Authentication error: {message}"),
            TransferError::Auth(message),
        )),

        // ============================================================
        // Member fetch
        // ============================================================
        (TransferState::FetchingMembers { source, target }, Event::MembersFetched { members }) => {
            let fetched = TransitionResult::new(TransferState::Idle).with_effect(Effect::info(
                format!("Fetched {} members from {source}", members.len()),
            ));

            if members.is_empty() {
                return Ok(finish(
                    fetched,
                    Effect::info("No members to add."),
                    TransferResult::completed(0),
                ));
            }

            let progress = InviteProgress {
                members: Arc::from(members),
                target: target.clone(),
                position: 0,
                invited: 0,
                phase: InvitePhase::AwaitingInvite,
            };
            let started = fetched.with_effect(Effect::info(format!(
                "Starting to add members to the group: {target}"
            )));
            Ok(advance(started, progress, 0, false, context))
        }

        (TransferState::FetchingMembers { .. }, Event::FetchFailed { message }) => Ok(abort(
            format!("Error fetching members: {message}"),
            TransferError::Lookup(message),
        )),

        // ============================================================
        // Invite loop
        // ============================================================
        (TransferState::Inviting(progress), Event::CooldownElapsed)
            if progress.phase == InvitePhase::CoolingDown =>
        {
            let member = progress.current().cloned().ok_or_else(|| {
                TransitionError::InvalidTransition(format!(
                    "cooldown elapsed past the end of the member list (position {})",
                    progress.position
                ))
            })?;
            let mut next = progress.clone();
            next.phase = InvitePhase::AwaitingInvite;
            let effect = Effect::Invite {
                group: next.target.clone(),
                member,
            };
            Ok(TransitionResult::new(TransferState::Inviting(next)).with_effect(effect))
        }

        (TransferState::Inviting(progress), Event::InviteSucceeded)
            if progress.phase == InvitePhase::AwaitingInvite =>
        {
            let mut next = progress.clone();
            next.invited += 1;
            let added = TransitionResult::new(TransferState::Idle)
                .with_effect(Effect::info(format!("Added: {}", handle_of(progress))));
            Ok(advance(added, next, progress.position + 1, true, context))
        }

        (TransferState::Inviting(progress), Event::InviteFailed { failure })
            if progress.phase == InvitePhase::AwaitingInvite =>
        {
            Ok(handle_invite_failure(progress, failure, context))
        }

        // Delivered between steps, never while a provider call is in flight
        (
            TransferState::Authenticating { .. } | TransferState::FetchingMembers { .. },
            Event::Cancelled,
        ) => Ok(finish(
            TransitionResult::new(TransferState::Idle),
            Effect::warning("Transfer cancelled. Total added: 0"),
            TransferResult::stopped(0, TerminationReason::Cancelled),
        )),

        (TransferState::Inviting(progress), Event::Cancelled) => Ok(finish(
            TransitionResult::new(TransferState::Idle),
            Effect::warning(format!(
                "Transfer cancelled. Total added: {}",
                progress.invited
            )),
            TransferResult::stopped(progress.invited, TerminationReason::Cancelled),
        )),

        // ============================================================
        // Everything else
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} in state {}",
            state.name()
        ))),
    }
}

fn handle_invite_failure(
    progress: &InviteProgress,
    failure: InviteFailure,
    context: &TransferContext,
) -> TransitionResult {
    let handle = handle_of(progress);
    match failure {
        InviteFailure::PrivacyRestricted => {
            let skipped = TransitionResult::new(TransferState::Idle).with_effect(
                Effect::warning(format!(
                    "User privacy settings prevented adding {handle}"
                )),
            );
            advance(skipped, progress.clone(), progress.position + 1, false, context)
        }
        InviteFailure::RateLimited => finish(
            TransitionResult::new(TransferState::Idle),
            Effect::warning("Rate limit reached. Stopping further additions."),
            TransferResult::stopped(progress.invited, TerminationReason::RateLimited),
        ),
        InviteFailure::TargetUnresolved(message) => abort(
            format!("Error adding members: {message}"),
            TransferError::Lookup(message),
        ),
        InviteFailure::Other(message) if context.policy.abort_on_unknown_error => abort(
            format!("Error adding members: {message}"),
            TransferError::UnknownInvite(message),
        ),
        InviteFailure::Other(message) => {
            let skipped = TransitionResult::new(TransferState::Idle).with_effect(
                Effect::warning(format!("Could not add {handle}, skipping: {message}")),
            );
            advance(skipped, progress.clone(), progress.position + 1, false, context)
        }
    }
}

/// Move to the next member with a handle at or after `from`.
///
/// Handle-less members are skipped with a debug entry. A cooldown owed by a
/// previous success is paid only if another invite is going to happen.
fn advance(
    mut result: TransitionResult,
    mut progress: InviteProgress,
    from: usize,
    cooldown_owed: bool,
    context: &TransferContext,
) -> TransitionResult {
    let mut position = from;
    while let Some(member) = progress.members.get(position) {
        if member.handle().is_some() {
            break;
        }
        result = result.with_effect(Effect::debug(format!(
            "Skipping member {} without username",
            member.id
        )));
        position += 1;
    }

    let Some(member) = progress.members.get(position).cloned() else {
        let invited = progress.invited;
        return finish(
            result,
            Effect::info(format!("Finished adding members. Total added: {invited}")),
            TransferResult::completed(invited),
        );
    };

    progress.position = position;
    let effect = if cooldown_owed {
        progress.phase = InvitePhase::CoolingDown;
        Effect::Cooldown {
            delay: context.policy.cooldown,
        }
    } else {
        progress.phase = InvitePhase::AwaitingInvite;
        Effect::Invite {
            group: progress.target.clone(),
            member,
        }
    };
    result.new_state = TransferState::Inviting(progress);
    result.with_effect(effect)
}

fn handle_of(progress: &InviteProgress) -> String {
    progress
        .current()
        .and_then(Member::handle)
        .unwrap_or("<unknown>")
        .to_string()
}

fn finish(result: TransitionResult, summary: Effect, outcome: TransferResult) -> TransitionResult {
    let mut result = result.with_effect(summary).with_effect(Effect::CloseSession);
    result.new_state = TransferState::Done { result: outcome };
    result
}

fn abort(message: String, error: TransferError) -> TransitionResult {
    TransitionResult::new(TransferState::Aborted { error })
        .with_effect(Effect::error(message))
        .with_effect(Effect::CloseSession)
}
