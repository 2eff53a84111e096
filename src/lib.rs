/*!
 * Deadline Guard Library
 * Time-bounded execution with teardown of leftover windows and processes
 */

pub mod cli;
pub mod config;
pub mod deadline;
pub mod errors;
pub mod guard;
pub mod limits;
pub mod monitoring;
pub mod resources;

// Re-exports
pub use config::{GuardConfig, OnExpiry};
pub use deadline::{resolve, sleep_until, Deadline, DeadlineResolver, DeadlineSpec};
pub use errors::*;
pub use guard::{guarded, DeadlineGuard, GuardReport, GuardRun, RunOutcome};
pub use monitoring::init_tracing;
pub use resources::{Handle, MatchRule, ProcessTable, Reconciler, WindowSystem};
