/*!
 * Poll Tick Decision
 *
 * One supervisor tick looks at the result slot and the clock and decides.
 * The slot is checked first: an outcome sitting in the slot at the decision
 * instant counts as completed even when the deadline has also passed. An
 * outcome that lands after that instant is a timeout. Under contention the
 * split between the two is therefore non-deterministic, bounded by one tick.
 */

use super::worker::Outcome;
use std::time::{Duration, Instant};

/// Result of one poll tick
#[derive(Debug)]
pub enum Tick<T, E> {
    /// The worker finished; its outcome wins
    Finished(Outcome<T, E>),
    /// Deadline passed with the worker still running
    Expired,
    /// Keep polling
    Continue,
}

impl<T, E> Tick<T, E> {
    pub fn decide(slot: Option<Outcome<T, E>>, now: Instant, cutoff: Instant) -> Self {
        match slot {
            Some(outcome) => Self::Finished(outcome),
            None if now >= cutoff => Self::Expired,
            None => Self::Continue,
        }
    }
}

/// How long the next tick may wait on the slot
#[inline]
pub fn tick_budget(poll_interval: Duration, cutoff: Instant) -> Duration {
    cutoff.saturating_duration_since(Instant::now()).min(poll_interval)
}
