/*!
 * Deadline Types
 *
 * `DeadlineSpec` is what callers hand in, `Deadline` is what the resolver
 * hands back: a single epoch value in milliseconds.
 */

use crate::errors::{DeadlineError, DeadlineResult};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Caller-supplied description of when to stop waiting
///
/// Only `Epoch` and `Text` survive a round trip through configuration files;
/// the two Rust-native variants are for programmatic use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeadlineSpec {
    /// Epoch timestamp in seconds
    Epoch(f64),

    /// Numeric string, `<n><unit>` duration, cron expression or free-form date
    Text(String),

    /// Relative to the moment of resolution
    #[serde(skip)]
    After(Duration),

    /// Absolute wall-clock time
    #[serde(skip)]
    At(SystemTime),
}

impl fmt::Display for DeadlineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch(secs) => write!(f, "{}", secs),
            Self::Text(text) => f.write_str(text),
            Self::After(d) => write!(f, "{}ms from now", d.as_millis()),
            Self::At(t) => write!(f, "{}", Deadline::from_system_time(*t)),
        }
    }
}

impl From<&str> for DeadlineSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DeadlineSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for DeadlineSpec {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<f64> for DeadlineSpec {
    fn from(secs: f64) -> Self {
        Self::Epoch(secs)
    }
}

impl From<i64> for DeadlineSpec {
    fn from(secs: i64) -> Self {
        Self::Epoch(secs as f64)
    }
}

impl From<u64> for DeadlineSpec {
    fn from(secs: u64) -> Self {
        Self::Epoch(secs as f64)
    }
}

impl From<Duration> for DeadlineSpec {
    fn from(d: Duration) -> Self {
        Self::After(d)
    }
}

impl From<SystemTime> for DeadlineSpec {
    fn from(t: SystemTime) -> Self {
        Self::At(t)
    }
}

/// Absolute point in time, stored as milliseconds since the Unix epoch
///
/// Kept numeric so comparisons never go through a calendar or timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deadline {
    epoch_millis: i64,
}

impl Deadline {
    #[inline]
    pub const fn from_epoch_millis(epoch_millis: i64) -> Self {
        Self { epoch_millis }
    }

    /// Build from fractional epoch seconds
    pub fn from_epoch_secs(secs: f64) -> DeadlineResult<Self> {
        let millis = (secs * 1000.0).round();
        if !millis.is_finite() || millis > i64::MAX as f64 || millis < i64::MIN as f64 {
            return Err(DeadlineError::InvalidEpoch(secs.to_string()));
        }
        Ok(Self::from_epoch_millis(millis as i64))
    }

    pub fn from_system_time(t: SystemTime) -> Self {
        Self::from_epoch_millis(system_time_millis(t))
    }

    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self::from_epoch_millis(dt.timestamp_millis())
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    #[inline]
    pub const fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }

    pub fn epoch_secs(&self) -> f64 {
        self.epoch_millis as f64 / 1000.0
    }

    /// Shift by a duration; `None` on overflow
    pub fn checked_add(&self, d: Duration) -> Option<Self> {
        let millis = i64::try_from(d.as_millis()).ok()?;
        self.epoch_millis.checked_add(millis).map(Self::from_epoch_millis)
    }

    /// Time left relative to `now`, zero once passed
    pub fn remaining_from(&self, now: Deadline) -> Duration {
        let delta = self.epoch_millis.saturating_sub(now.epoch_millis);
        if delta <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(delta as u64)
        }
    }

    /// Time left relative to the wall clock
    pub fn remaining(&self) -> Duration {
        self.remaining_from(Self::now())
    }

    pub fn has_passed(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Project onto the monotonic clock
    ///
    /// Done once per run; every later comparison uses the returned `Instant`,
    /// so wall-clock adjustments during the run do not move the cutoff.
    pub fn to_instant(&self) -> Instant {
        let now = Instant::now();
        now.checked_add(self.remaining())
            .unwrap_or(now + Duration::from_secs(86_400 * 365))
    }

    pub fn to_local(&self) -> Option<DateTime<Local>> {
        Utc.timestamp_millis_opt(self.epoch_millis)
            .single()
            .map(|dt| dt.with_timezone(&Local))
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_local() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "@{}ms", self.epoch_millis),
        }
    }
}

fn system_time_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => i64::try_from(e.duration().as_millis())
            .map(|m| -m)
            .unwrap_or(i64::MIN),
    }
}
