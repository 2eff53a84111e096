/*!
 * Resource Drift Handling
 *
 * Windows and processes a piece of work leaves behind, and how to get rid of
 * them.
 *
 * ## Pipeline
 *
 * 1. **Snapshot**: capture handles before the work starts
 * 2. **Match**: select current resources by glob on title / name / command line
 * 3. **Diff**: keep only handles absent from the snapshot
 * 4. **Terminate**: close windows; terminate, wait, then kill processes
 *
 * Every stage swallows per-resource failures. Nothing in this module returns
 * an error to the caller of a guarded run.
 */

pub mod backends;
mod matcher;
mod reconcile;
mod snapshot;
mod terminate;
mod traits;
mod types;

pub use matcher::{glob_to_regex, match_processes, match_windows, GlobPattern, MatchRule, Matcher};
pub use reconcile::{Baseline, Reconciler, Targets, Teardown};
pub use snapshot::{diff, Snapshot};
pub use terminate::{close_windows, terminate, terminate_processes, TerminationReport};
pub use traits::{ProcessTable, WindowSystem};
pub use types::{Domain, Handle, ProcessInfo, WindowInfo};
