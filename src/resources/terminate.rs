/*!
 * Termination Executor
 *
 * Staged, best-effort shutdown:
 *
 * - **Windows**: graceful close only, never escalated
 * - **Processes**: terminate, wait up to the exit timeout, then kill
 *
 * Nothing here returns an error. Failures are logged and counted in the
 * report; a handle that is already gone is a no-op.
 */

use super::traits::{ProcessTable, WindowSystem};
use super::types::{Domain, Handle};
use crate::errors::ResourceError;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// What happened to the handles of one domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TerminationReport {
    /// Windows closed gracefully
    pub closed: usize,
    /// Processes that exited after the terminate request
    pub terminated: usize,
    /// Processes that had to be killed
    pub killed: usize,
    /// Handles that were already gone
    pub vanished: usize,
    /// Handles that could not be shut down
    pub failed: usize,
}

impl TerminationReport {
    /// Handles the executor saw
    pub fn total(&self) -> usize {
        self.closed + self.terminated + self.killed + self.vanished + self.failed
    }
}

/// Close each window once
pub fn close_windows(system: &dyn WindowSystem, handles: &BTreeSet<Handle>) -> TerminationReport {
    let mut report = TerminationReport::default();

    for &handle in handles {
        match system.close_window(handle) {
            Ok(()) => {
                debug!("Closed window {}", handle);
                report.closed += 1;
            }
            Err(ResourceError::NoSuchResource(_)) => report.vanished += 1,
            Err(e) => {
                warn!("Failed to close window {}: {}", handle, e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Terminate each process, escalating to kill after `exit_timeout`
pub fn terminate_processes(
    table: &dyn ProcessTable,
    handles: &BTreeSet<Handle>,
    exit_timeout: Duration,
) -> TerminationReport {
    let mut report = TerminationReport::default();

    for &handle in handles {
        match table.terminate_process(handle) {
            Ok(()) => {}
            Err(ResourceError::NoSuchResource(_)) => {
                debug!("Process {} already gone", handle);
                report.vanished += 1;
                continue;
            }
            Err(e) => {
                warn!("Failed to terminate process {}: {}", handle, e);
                report.failed += 1;
                continue;
            }
        }

        match table.wait_process(handle, exit_timeout) {
            Ok(()) => {
                debug!("Process {} exited after terminate", handle);
                report.terminated += 1;
            }
            Err(reason) => {
                debug!("Escalating process {} to kill: {}", handle, reason);
                match table.kill_process(handle) {
                    Ok(()) => {
                        info!("Killed process {} after {:?}", handle, exit_timeout);
                        report.killed += 1;
                    }
                    // Exited between the wait and the kill
                    Err(ResourceError::NoSuchResource(_)) => report.terminated += 1,
                    Err(e) => {
                        warn!("Failed to kill process {}: {}", handle, e);
                        report.failed += 1;
                    }
                }
            }
        }
    }

    report
}

/// Domain-dispatching entry point
pub fn terminate(
    domain: Domain,
    windows: &dyn WindowSystem,
    processes: &dyn ProcessTable,
    handles: &BTreeSet<Handle>,
    exit_timeout: Duration,
) -> TerminationReport {
    match domain {
        Domain::Window => close_windows(windows, handles),
        Domain::Process => terminate_processes(processes, handles, exit_timeout),
    }
}
