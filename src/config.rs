/*!
 * Guard Configuration
 *
 * Explicit per-run configuration. Nothing is shared between runs: each
 * `DeadlineGuard` owns its own `GuardConfig`.
 *
 * Environment overrides (applied by `apply_env`):
 * - DEADLINE_GUARD_POLL_MS: supervisor poll interval
 * - DEADLINE_GUARD_EXIT_TIMEOUT_MS: grace period between terminate and kill
 */

use crate::deadline::DeadlineSpec;
use crate::errors::{ConfigError, ConfigResult};
use crate::limits::{DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, PROCESS_EXIT_TIMEOUT};
use crate::resources::MatchRule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_POLL_MS: &str = "DEADLINE_GUARD_POLL_MS";
pub const ENV_EXIT_TIMEOUT_MS: &str = "DEADLINE_GUARD_EXIT_TIMEOUT_MS";

/// What happens to a worker still running when the deadline fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnExpiry {
    /// Abandon the worker thread; it keeps running detached and is leaked
    Detach,

    /// Wait for the worker to finish after teardown
    Join,
}

/// Configuration for one guarded run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// When to stop waiting
    pub deadline: DeadlineSpec,

    /// Windows eligible for teardown
    #[serde(default)]
    pub windows: MatchRule,

    /// Descendant processes eligible for teardown
    #[serde(default)]
    pub processes: MatchRule,

    /// Only tear down resources that appeared while the work ran
    #[serde(default = "default_new_only")]
    pub new_only: bool,

    /// Worker handling on expiry; always explicit
    pub on_expiry: OnExpiry,

    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_exit_timeout_ms")]
    pub process_exit_timeout_ms: u64,
}

fn default_new_only() -> bool {
    true
}

fn default_poll_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_exit_timeout_ms() -> u64 {
    PROCESS_EXIT_TIMEOUT.as_millis() as u64
}

impl GuardConfig {
    fn with_policy(deadline: DeadlineSpec, on_expiry: OnExpiry) -> Self {
        Self {
            deadline,
            windows: MatchRule::Skip,
            processes: MatchRule::Skip,
            new_only: default_new_only(),
            on_expiry,
            poll_interval_ms: default_poll_ms(),
            process_exit_timeout_ms: default_exit_timeout_ms(),
        }
    }

    /// Abandon the worker on expiry
    pub fn detached(deadline: impl Into<DeadlineSpec>) -> Self {
        Self::with_policy(deadline.into(), OnExpiry::Detach)
    }

    /// Join the worker after teardown on expiry
    pub fn joined(deadline: impl Into<DeadlineSpec>) -> Self {
        Self::with_policy(deadline.into(), OnExpiry::Join)
    }

    pub fn with_windows(mut self, rule: impl Into<MatchRule>) -> Self {
        self.windows = rule.into();
        self
    }

    pub fn with_processes(mut self, rule: impl Into<MatchRule>) -> Self {
        self.processes = rule.into();
        self
    }

    pub fn with_new_only(mut self, new_only: bool) -> Self {
        self.new_only = new_only;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_process_exit_timeout(mut self, timeout: Duration) -> Self {
        self.process_exit_timeout_ms = timeout.as_millis() as u64;
        self
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn process_exit_timeout(&self) -> Duration {
        Duration::from_millis(self.process_exit_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval() < MIN_POLL_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "poll interval must be at least {}ms",
                MIN_POLL_INTERVAL.as_millis()
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply environment overrides on top of this config
    pub fn apply_env(mut self) -> ConfigResult<Self> {
        if let Some(ms) = read_env_millis(ENV_POLL_MS)? {
            self.poll_interval_ms = ms;
        }
        if let Some(ms) = read_env_millis(ENV_EXIT_TIMEOUT_MS)? {
            self.process_exit_timeout_ms = ms;
        }
        self.validate()?;
        Ok(self)
    }
}

fn read_env_millis(var: &'static str) -> ConfigResult<Option<u64>> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        Err(_) => Ok(None),
    }
}
