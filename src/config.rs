//! Runtime configuration
//!
//! Policy knobs and paths come from the environment, with defaults that
//! match the provider's usual tolerance for group invites.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);
pub const DEFAULT_LOG_PATH: &str = "telegram_member_transfer.log";
pub const DEFAULT_SESSION_NAME: &str = "session";
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8081";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },
    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

/// Invite pacing and error policy
#[derive(Debug, Clone, PartialEq)]
pub struct InvitePolicy {
    /// Delay between a successful invite and the next invite call
    pub cooldown: Duration,
    /// Abort the run on an unclassified invite failure instead of skipping
    pub abort_on_unknown_error: bool,
}

impl Default for InvitePolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            abort_on_unknown_error: true,
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TransferConfig {
    pub policy: InvitePolicy,
    pub log_path: PathBuf,
    /// Session name handed to the bridge, which owns the session file
    pub session_name: String,
    pub bridge_url: String,
    pub request_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            policy: InvitePolicy::default(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            session_name: DEFAULT_SESSION_NAME.to_string(),
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TransferConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cooldown = match non_empty("MEMBER_TRANSFER_COOLDOWN_SECS") {
            Some(v) => parse_seconds("MEMBER_TRANSFER_COOLDOWN_SECS", &v)?,
            None => defaults.policy.cooldown,
        };
        let abort_on_unknown_error = match non_empty("MEMBER_TRANSFER_ABORT_ON_UNKNOWN_ERROR") {
            Some(v) => parse_bool("MEMBER_TRANSFER_ABORT_ON_UNKNOWN_ERROR", &v)?,
            None => defaults.policy.abort_on_unknown_error,
        };
        let request_timeout = match non_empty("MEMBER_TRANSFER_REQUEST_TIMEOUT_SECS") {
            Some(v) => parse_seconds("MEMBER_TRANSFER_REQUEST_TIMEOUT_SECS", &v)?,
            None => defaults.request_timeout,
        };

        Ok(Self {
            policy: InvitePolicy {
                cooldown,
                abort_on_unknown_error,
            },
            log_path: non_empty("MEMBER_TRANSFER_LOG_PATH")
                .map_or(defaults.log_path, PathBuf::from),
            session_name: non_empty("MEMBER_TRANSFER_SESSION").unwrap_or(defaults.session_name),
            bridge_url: non_empty("MEMBER_TRANSFER_BRIDGE_URL").unwrap_or(defaults.bridge_url),
            request_timeout,
        })
    }
}

fn parse_seconds(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| ConfigError::InvalidSeconds {
            var,
            value: value.to_string(),
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
