//! Transfer state types

use super::error::{InputError, TransferError};
use crate::config::InvitePolicy;
use crate::provider::{Credentials, GroupRef, Member};
use std::sync::Arc;

/// The five values the operator fills in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferInputs {
    pub api_id: String,
    pub api_hash: String,
    pub phone: String,
    pub source_group: String,
    pub target_group: String,
}

impl TransferInputs {
    /// Check every field is present and turn them into provider types
    pub fn validate(&self) -> Result<(Credentials, GroupRef, GroupRef), InputError> {
        let fields = [
            ("api id", &self.api_id),
            ("api hash", &self.api_hash),
            ("phone", &self.phone),
            ("source group", &self.source_group),
            ("target group", &self.target_group),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(InputError::MissingFields(missing));
        }

        let api_id = self
            .api_id
            .trim()
            .parse::<i32>()
            .map_err(|_| InputError::InvalidApiId(self.api_id.clone()))?;

        let credentials = Credentials {
            api_id,
            api_hash: self.api_hash.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };
        Ok((
            credentials,
            GroupRef::parse(&self.source_group),
            GroupRef::parse(&self.target_group),
        ))
    }
}

/// Immutable context for one run
#[derive(Debug, Clone)]
pub struct TransferContext {
    pub inputs: TransferInputs,
    pub policy: InvitePolicy,
}

impl TransferContext {
    pub fn new(inputs: TransferInputs, policy: InvitePolicy) -> Self {
        Self { inputs, policy }
    }
}

/// Why the invite loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    None,
    RateLimited,
    /// Operator cancelled between members
    Cancelled,
}

/// Outcome of a run that reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResult {
    pub invited_count: u32,
    pub terminated_early: bool,
    pub termination_reason: TerminationReason,
}

impl TransferResult {
    pub fn completed(invited_count: u32) -> Self {
        Self::stopped(invited_count, TerminationReason::None)
    }

    pub fn stopped(invited_count: u32, reason: TerminationReason) -> Self {
        Self {
            invited_count,
            terminated_early: reason != TerminationReason::None,
            termination_reason: reason,
        }
    }
}

/// What the invite loop is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitePhase {
    /// Cooldown owed by the previous success is running
    CoolingDown,
    /// Invite for the member at `position` is in flight
    AwaitingInvite,
}

/// Progress through the member list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteProgress {
    pub members: Arc<[Member]>,
    pub target: GroupRef,
    /// Index of the member being handled (always one with a handle)
    pub position: usize,
    pub invited: u32,
    pub phase: InvitePhase,
}

impl InviteProgress {
    pub fn current(&self) -> Option<&Member> {
        self.members.get(self.position)
    }
}

/// Transfer workflow state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    Authenticating {
        source: GroupRef,
        target: GroupRef,
    },
    FetchingMembers {
        source: GroupRef,
        target: GroupRef,
    },
    Inviting(InviteProgress),
    Done {
        result: TransferResult,
    },
    Aborted {
        error: TransferError,
    },
}

impl TransferState {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Idle => "idle",
            TransferState::Authenticating { .. } => "authenticating",
            TransferState::FetchingMembers { .. } => "fetching_members",
            TransferState::Inviting(_) => "inviting",
            TransferState::Done { .. } => "done",
            TransferState::Aborted { .. } => "aborted",
        }
    }
}
