//! Effects produced by state transitions

use crate::journal::Level;
use crate::provider::{Credentials, GroupRef, Member};
use std::time::Duration;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write a line to the journal
    Log { level: Level, message: String },

    /// Connect and sign in, prompting for a code if needed
    Authenticate { credentials: Credentials },

    /// List every member of the source group
    FetchMembers { group: GroupRef },

    /// Invite one member into the target group
    Invite { group: GroupRef, member: Member },

    /// Wait before the next invite
    Cooldown { delay: Duration },

    /// Disconnect; failures are logged and swallowed
    CloseSession,
}

impl Effect {
    pub fn debug(message: impl Into<String>) -> Self {
        Effect::Log {
            level: Level::Debug,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Effect::Log {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Effect::Log {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Effect::Log {
            level: Level::Error,
            message: message.into(),
        }
    }
}
