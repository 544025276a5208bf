//! Events that drive the transfer

use crate::provider::Member;

/// How a single invite failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteFailure {
    PrivacyRestricted,
    RateLimited,
    /// The target group could not be resolved
    TargetUnresolved(String),
    Other(String),
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Operator events
    Start,
    Cancelled,

    // Session events
    Authenticated,
    AuthFailed { message: String },
    MembersFetched { members: Vec<Member> },
    FetchFailed { message: String },

    // Invite loop events
    InviteSucceeded,
    InviteFailed { failure: InviteFailure },
    CooldownElapsed,
}
