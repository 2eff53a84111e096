/*!
 * Guarded Execution
 *
 * Wraps a work unit with a deadline. The work runs on a dedicated worker
 * thread while the supervisor polls; if the deadline wins, resources the work
 * left behind are torn down and the caller gets `None` back.
 *
 * ## Example
 *
 * ```ignore
 * let value = guarded("2s", || Ok::<_, std::io::Error>(compute()))?;
 * ```
 */

mod report;
mod supervisor;
mod tick;
mod worker;

pub use report::{GuardReport, GuardRun, RunOutcome};
pub use supervisor::{guarded, DeadlineGuard};
pub use tick::{tick_budget, Tick};
pub use worker::{Outcome, WorkerHandle};
