//! Transfer journal
//!
//! Every message the workflow emits goes to two places: the operator's log
//! stream and an append-only file. Both writes happen under one lock so the
//! two views never interleave differently.

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Severity tag of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for workflow log messages
pub trait LogSink: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn record(&self, level: Level, message: &str) {
        (**self).record(level, message);
    }
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to open log file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Format one persistent log line: `<timestamp> - <LEVEL> - <message>`
pub fn format_line(timestamp: &DateTime<Local>, level: Level, message: &str) -> String {
    format!("{} - {} - {}", timestamp.format(TIMESTAMP_FORMAT), level, message)
}

struct JournalInner {
    file: File,
    operator: Box<dyn Write + Send>,
    last_timestamp: Option<DateTime<Local>>,
}

/// File-backed journal with an operator echo
pub struct Journal {
    inner: Mutex<JournalInner>,
}

impl Journal {
    /// Open `path` for appending (creating it if needed) and echo to `operator`
    pub fn open(path: &Path, operator: Box<dyn Write + Send>) -> Result<Self, JournalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| JournalError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            inner: Mutex::new(JournalInner {
                file,
                operator,
                last_timestamp: None,
            }),
        })
    }
}

impl LogSink for Journal {
    fn record(&self, level: Level, message: &str) {
        // The operator already sees every entry; the diagnostic copy stays at debug
        tracing::debug!(
            target: "member_transfer::journal",
            level = level.as_str(),
            "{message}"
        );

        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("journal lock poisoned, dropping entry");
            return;
        };

        // Wall clock can step backwards; entries must not.
        let now = Local::now();
        let timestamp = match inner.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        inner.last_timestamp = Some(timestamp);

        let line = format_line(&timestamp, level, message);
        if let Err(e) = writeln!(inner.file, "{line}").and_then(|()| inner.file.flush()) {
            tracing::error!(error = %e, "failed to append to log file");
        }

        let echo = if level == Level::Info {
            message.to_string()
        } else {
            format!("[{}] {message}", level.as_str().to_lowercase())
        };
        if let Err(e) = writeln!(inner.operator, "{echo}").and_then(|()| inner.operator.flush()) {
            tracing::error!(error = %e, "failed to write to operator log stream");
        }
    }
}
