/*!
 * Clock Abstraction
 * Source of "now" for the resolver, substitutable in tests
 */

use chrono::{DateTime, Local, TimeZone, Utc};

/// Wall-clock source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Local>,
}

impl FixedClock {
    pub fn new(at: DateTime<Local>) -> Self {
        Self { at }
    }

    /// Freeze at an epoch timestamp; falls back to the Unix epoch if out of range
    pub fn at_epoch_millis(epoch_millis: i64) -> Self {
        let at = Utc
            .timestamp_millis_opt(epoch_millis)
            .single()
            .unwrap_or_default()
            .with_timezone(&Local);
        Self { at }
    }
}

impl Clock for FixedClock {
    #[inline]
    fn now(&self) -> DateTime<Local> {
        self.at
    }
}
