//! Terminal operator surface
//!
//! Collects the five transfer fields, answers the verification-code prompt,
//! and renders the end-of-run notice.

use crate::runtime::OperatorPrompt;
use crate::transfer::{TerminationReason, TransferError, TransferInputs, TransferResult};
use async_trait::async_trait;
use crossterm::style::Stylize;
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Field labels, in form order, with the variable that can pre-fill each
pub const FIELDS: [(&str, &str); 5] = [
    ("Telegram API ID", "MEMBER_TRANSFER_API_ID"),
    ("Telegram API Hash", "MEMBER_TRANSFER_API_HASH"),
    ("Phone Number", "MEMBER_TRANSFER_PHONE"),
    ("Source Group Username (without @)", "MEMBER_TRANSFER_SOURCE_GROUP"),
    ("Target Group Username (without @)", "MEMBER_TRANSFER_TARGET_GROUP"),
];

/// Line-oriented terminal shared by the form and the code prompt
pub struct Console {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    /// Print `label` and read one line. `None` on end of input.
    async fn ask(&self, label: &str) -> Option<String> {
        print!("{label} ");
        if let Err(e) = std::io::stdout().flush() {
            tracing::warn!(error = %e, "failed to flush prompt");
        }
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to read operator input");
                None
            }
        }
    }

    /// Fill the form: pre-filled values from `lookup`, the rest from stdin
    pub async fn collect_inputs(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> TransferInputs {
        let mut values = Vec::with_capacity(FIELDS.len());
        for (label, var) in FIELDS {
            let value = match lookup(var) {
                Some(v) => v,
                None => self.ask(&format!("{label}:")).await.unwrap_or_default(),
            };
            values.push(value);
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        TransferInputs {
            api_id: next(),
            api_hash: next(),
            phone: next(),
            source_group: next(),
            target_group: next(),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperatorPrompt for Console {
    async fn request_input(&self, prompt: &str) -> Option<String> {
        self.ask(&format!("Code Required - {prompt}")).await
    }
}

/// End-of-run notice shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Complete { invited: u32 },
    RateLimited { invited: u32 },
    Cancelled { invited: u32 },
    InputRejected(String),
    Failed(String),
}

impl Notice {
    pub fn from_outcome(outcome: &Result<TransferResult, TransferError>) -> Self {
        match outcome {
            Ok(result) => match result.termination_reason {
                TerminationReason::None => Notice::Complete {
                    invited: result.invited_count,
                },
                TerminationReason::RateLimited => Notice::RateLimited {
                    invited: result.invited_count,
                },
                TerminationReason::Cancelled => Notice::Cancelled {
                    invited: result.invited_count,
                },
            },
            Err(TransferError::Input(e)) => Notice::InputRejected(e.to_string()),
            Err(e) => Notice::Failed(e.to_string()),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::Complete { .. } => "Complete",
            Notice::RateLimited { .. } => "Rate Limit",
            Notice::Cancelled { .. } => "Cancelled",
            Notice::InputRejected(_) => "Input Error",
            Notice::Failed(_) => "Error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Complete { invited } => format!("Added {invited} members successfully!"),
            Notice::RateLimited { invited } => format!(
                "Telegram rate limit reached. Try again later. ({invited} members added)"
            ),
            Notice::Cancelled { invited } => {
                format!("Transfer cancelled. {invited} members added.")
            }
            Notice::InputRejected(message) | Notice::Failed(message) => message.clone(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        match self {
            Notice::Complete { .. } => ExitCode::SUCCESS,
            Notice::RateLimited { .. } | Notice::Cancelled { .. } => ExitCode::from(2),
            Notice::InputRejected(_) | Notice::Failed(_) => ExitCode::FAILURE,
        }
    }

    /// Print the notice, colored by severity
    pub fn render(&self) {
        let line = format!("{}: {}", self.title(), self.message());
        match self {
            Notice::Complete { .. } => println!("{}", line.green().bold()),
            Notice::RateLimited { .. } | Notice::Cancelled { .. } => {
                println!("{}", line.yellow().bold());
            }
            Notice::InputRejected(_) | Notice::Failed(_) => eprintln!("{}", line.red().bold()),
        }
    }
}
