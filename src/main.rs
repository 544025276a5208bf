//! Member Transfer - copy members between Telegram groups
//!
//! Authenticates an operator account, lists the source group's members and
//! invites each one into the target group, pacing invites and stopping
//! cleanly on provider rate limits.

mod config;
mod console;
mod journal;
mod provider;
mod runtime;
mod session;
mod transfer;

use config::TransferConfig;
use console::{Console, Notice};
use journal::{Journal, Level, LogSink};
use provider::{BridgeClient, LoggingClient};
use runtime::{ProductionRuntime, TokioPacer};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transfer::{TransferContext, TransferError};

fn main() -> ExitCode {
    // Diagnostics go to stderr so they never interleave with the form
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "member_transfer=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            let notice = Notice::Failed(format!("Failed to start async runtime: {e}"));
            notice.render();
            return notice.exit_code();
        }
    };

    let notice = runtime.block_on(async {
        match run().await {
            Ok(outcome) => Notice::from_outcome(&outcome),
            Err(message) => Notice::Failed(message),
        }
    });
    // A code prompt abandoned on cancel leaves a stdin read that never returns
    runtime.shutdown_background();

    notice.render();
    notice.exit_code()
}

/// Set up one run. The outer error covers setup failures before the
/// runtime starts; the inner result is the run itself.
async fn run() -> Result<Result<transfer::TransferResult, TransferError>, String> {
    let config = TransferConfig::from_env().map_err(|e| e.to_string())?;
    tracing::info!(
        bridge = %config.bridge_url,
        session = %config.session_name,
        log_path = %config.log_path.display(),
        cooldown_secs = config.policy.cooldown.as_secs_f64(),
        "Configuration loaded"
    );

    let console = Console::new();
    let inputs = console
        .collect_inputs(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .await;

    let journal = Journal::open(&config.log_path, Box::new(std::io::stdout()))
        .map_err(|e| e.to_string())?;
    let sink: Arc<dyn LogSink> = Arc::new(journal);

    let bridge = open_bridge(&config, sink.as_ref())?;

    let cancel = CancellationToken::new();
    let runtime: ProductionRuntime<Console> = ProductionRuntime::new(
        TransferContext::new(inputs, config.policy),
        LoggingClient::new(bridge),
        console,
        TokioPacer,
        sink.clone(),
        cancel.clone(),
    );

    let mut handle = tokio::spawn(runtime.run());
    let joined = loop {
        tokio::select! {
            joined = &mut handle => break joined,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "failed to listen for ctrl-c");
                    // Keep waiting for the run without a signal handler
                    let joined = (&mut handle).await;
                    break joined;
                }
                if cancel.is_cancelled() {
                    // Second interrupt: drop the run, in-flight call included
                    sink.record(
                        Level::Error,
                        "Interrupted again. Exiting without closing the session.",
                    );
                    handle.abort();
                    return Ok(Err(TransferError::Interrupted(
                        "interrupted by the operator".to_string(),
                    )));
                }
                sink.record(
                    Level::Warning,
                    "Cancellation requested. Stopping after the current step. Press Ctrl-C again to exit now.",
                );
                cancel.cancel();
            }
        }
    };

    joined.map_err(|e| format!("transfer task failed: {e}"))
}

/// Build the bridge client, journaling the failure if it cannot be built
fn open_bridge(config: &TransferConfig, sink: &dyn LogSink) -> Result<BridgeClient, String> {
    BridgeClient::new(
        &config.bridge_url,
        config.session_name.clone(),
        config.request_timeout,
    )
    .map_err(|e| {
        sink.record(Level::Error, &e.message);
        e.message
    })
}
