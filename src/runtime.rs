//! Runtime for executing a transfer
//!
//! Owns all I/O for one run: the session controller, the operator prompt,
//! the pacer and the journal. The state machine itself stays pure.

mod executor;
pub mod traits;


pub use executor::TransferRuntime;
pub use traits::*;

use crate::provider::{BridgeClient, LoggingClient};

/// Type alias for the production runtime with concrete implementations
pub type ProductionRuntime<P> = TransferRuntime<LoggingClient<BridgeClient>, P, TokioPacer>;
