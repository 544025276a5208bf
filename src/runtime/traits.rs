//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Synchronous "ask the operator" capability
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Show `prompt` and wait for a line. `None` if the operator dismissed it.
    async fn request_input(&self, prompt: &str) -> Option<String>;
}

/// Inter-invite delay
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait for `delay`. Returns false if `cancel` fired first.
    async fn wait(&self, delay: Duration, cancel: &CancellationToken) -> bool;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: OperatorPrompt + ?Sized> OperatorPrompt for Arc<T> {
    async fn request_input(&self, prompt: &str) -> Option<String> {
        (**self).request_input(prompt).await
    }
}

#[async_trait]
impl<T: Pacer + ?Sized> Pacer for Arc<T> {
    async fn wait(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        (**self).wait(delay, cancel).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn wait(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            () = tokio::time::sleep(delay) => true,
            () = cancel.cancelled() => false,
        }
    }
}
