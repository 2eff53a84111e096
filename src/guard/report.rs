/*!
 * Run Reports
 * What a guarded run did, for logging and the CLI
 */

use crate::deadline::Deadline;
use crate::resources::Teardown;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// How the run ended from the supervisor's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The worker finished before the deadline
    Completed,
    /// The deadline fired first
    Expired,
}

/// Summary of one guarded run
#[derive(Debug, Clone, Serialize)]
pub struct GuardReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    pub deadline: Deadline,
    pub elapsed: Duration,
    /// Present only when the deadline fired
    pub teardown: Option<Teardown>,
}

impl GuardReport {
    pub fn expired(&self) -> bool {
        self.outcome == RunOutcome::Expired
    }
}

/// Value of a guarded run plus its report
///
/// `value` is `None` when the worker was abandoned.
#[derive(Debug)]
pub struct GuardRun<T> {
    pub value: Option<T>,
    pub report: GuardReport,
}
