/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use crate::resources::Handle;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Optional parsing capabilities the resolver may need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Cron,
    NaturalLanguage,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cron => f.write_str("cron expression"),
            Self::NaturalLanguage => f.write_str("natural-language date"),
        }
    }
}

/// Deadline resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum DeadlineError {
    #[error("Could not resolve a deadline from {0:?}")]
    #[diagnostic(
        code(deadline::unresolvable),
        help("Use an epoch timestamp, a duration like \"30s\" or \"2h\", a cron expression, or a date such as \"tomorrow 5pm\".")
    )]
    Unresolvable(String),

    #[error("{capability} parsing is unavailable, needed for {spec:?}")]
    #[diagnostic(
        code(deadline::missing_capability),
        help("Build with the `cron` and `natural-language` features, or configure a calendar parser on the resolver.")
    )]
    MissingCapability { capability: Capability, spec: String },

    #[error("Epoch timestamp out of range: {0}")]
    #[diagnostic(code(deadline::invalid_epoch))]
    InvalidEpoch(String),
}

pub type DeadlineResult<T> = Result<T, DeadlineError>;

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(config::invalid))]
    Invalid(String),

    #[error("Invalid pattern {pattern:?}: {reason}")]
    #[diagnostic(
        code(config::invalid_pattern),
        help("Patterns are globs: `*` matches any run of characters, `?` matches one.")
    )]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    #[diagnostic(code(config::parse))]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value {value:?} for environment variable {var}")]
    #[diagnostic(code(config::env))]
    Env { var: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Resource-layer errors
///
/// Always caught inside the snapshot, matcher and termination layers; they
/// never reach the caller of a guarded run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ResourceError {
    #[error("Resource {0} no longer exists")]
    #[diagnostic(code(resource::no_such_resource))]
    NoSuchResource(Handle),

    #[error("Access to resource {0} denied")]
    #[diagnostic(code(resource::access_denied))]
    AccessDenied(Handle),

    #[error("Resource {handle} still alive after {timeout_ms}ms")]
    #[diagnostic(code(resource::timeout_expired))]
    TimeoutExpired { handle: Handle, timeout_ms: u64 },

    #[error("Resource backend unavailable: {0}")]
    #[diagnostic(code(resource::unavailable))]
    Unavailable(String),

    #[error("Resource backend I/O failure: {0}")]
    #[diagnostic(code(resource::io))]
    Io(String),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Guarded run errors
///
/// `Work` carries whatever the work unit itself returned and is surfaced
/// regardless of whether the deadline fired.
#[derive(Error, Debug)]
pub enum GuardError<E> {
    #[error("Deadline error: {0}")]
    Deadline(#[from] DeadlineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Work unit failed: {0}")]
    Work(#[source] E),

    #[error("Work unit panicked: {0}")]
    WorkerPanicked(String),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Supervisor task failed: {0}")]
    Supervisor(String),
}

impl<E> GuardError<E> {
    /// Check if this error came from the work unit
    #[inline]
    pub fn is_work(&self) -> bool {
        matches!(self, Self::Work(_))
    }

    /// Take the work unit's own error, if that is what this is
    pub fn into_work(self) -> Option<E> {
        match self {
            Self::Work(e) => Some(e),
            _ => None,
        }
    }
}

pub type GuardResult<T, E> = Result<T, GuardError<E>>;
