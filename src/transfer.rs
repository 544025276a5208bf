//! Transfer workflow state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `Idle → Authenticating → FetchingMembers → Inviting → Done`, with
//! `Aborted` on unrecoverable failure.

mod effect;
mod error;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use error::{InputError, TransferError};
pub use event::{Event, InviteFailure};
pub use state::{
    TerminationReason, TransferContext, TransferInputs, TransferResult, TransferState,
};
pub use transition::{transition, TransitionError};
