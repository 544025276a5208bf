//! Transfer error types

use thiserror::Error;

/// Operator input rejected before anything external is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("All fields are required! Missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("API ID must be a number, got {0:?}")]
    InvalidApiId(String),
}

/// Why a run ended without completing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Could not fetch members: {0}")]
    Lookup(String),
    #[error("Could not add members: {0}")]
    UnknownInvite(String),
    /// The executor stopped outside a terminal state
    #[error("Transfer interrupted: {0}")]
    Interrupted(String),
}
