/*!
 * Resource Reconciliation
 *
 * Snapshot, match, diff and terminate across both domains. Usable on its own
 * to clean up after any piece of work, not only from the deadline guard.
 */

use super::matcher::{match_processes, match_windows, MatchRule, Matcher};
use super::snapshot::{diff, Snapshot};
use super::terminate::{close_windows, terminate_processes, TerminationReport};
use super::traits::{ProcessTable, WindowSystem};
use super::types::{Domain, Handle};
use crate::errors::ConfigResult;
use crate::limits::PROCESS_EXIT_TIMEOUT;
use crate::monitoring::span_phase;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pre-execution snapshots
///
/// `None` for a domain means it was skipped or could not be enumerated.
#[derive(Debug, Clone, Default)]
pub struct Baseline {
    pub windows: Option<Snapshot>,
    pub processes: Option<Snapshot>,
}

impl Baseline {
    pub fn get(&self, domain: Domain) -> Option<&Snapshot> {
        match domain {
            Domain::Window => self.windows.as_ref(),
            Domain::Process => self.processes.as_ref(),
        }
    }
}

/// Termination targets per domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Targets {
    pub windows: BTreeSet<Handle>,
    pub processes: BTreeSet<Handle>,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Teardown {
    pub targets: Targets,
    pub windows: TerminationReport,
    pub processes: TerminationReport,
}

/// Matches and tears down resources of both domains
#[derive(Clone)]
pub struct Reconciler {
    window_system: Arc<dyn WindowSystem>,
    process_table: Arc<dyn ProcessTable>,
    windows: Matcher,
    processes: Matcher,
    exit_timeout: Duration,
}

impl Reconciler {
    /// Compile both rules; fails only on an invalid pattern
    pub fn new(
        window_system: Arc<dyn WindowSystem>,
        process_table: Arc<dyn ProcessTable>,
        windows: &MatchRule,
        processes: &MatchRule,
    ) -> ConfigResult<Self> {
        Ok(Self {
            window_system,
            process_table,
            windows: Matcher::compile(windows)?,
            processes: Matcher::compile(processes)?,
            exit_timeout: PROCESS_EXIT_TIMEOUT,
        })
    }

    pub fn with_exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = timeout;
        self
    }

    fn matcher(&self, domain: Domain) -> &Matcher {
        match domain {
            Domain::Window => &self.windows,
            Domain::Process => &self.processes,
        }
    }

    /// Snapshot every enabled domain
    pub fn capture(&self) -> Baseline {
        let phase = span_phase("snapshot");
        let _entered = phase.enter();

        let windows = self
            .windows
            .is_enabled()
            .then(|| Snapshot::windows(self.window_system.as_ref()))
            .and_then(|r| {
                r.map_err(|e| warn!(error = %e, "window baseline unavailable"))
                    .ok()
            });

        let processes = self
            .processes
            .is_enabled()
            .then(|| Snapshot::processes(self.process_table.as_ref()))
            .and_then(|r| {
                r.map_err(|e| warn!(error = %e, "process baseline unavailable"))
                    .ok()
            });

        phase.record_items(
            windows.as_ref().map_or(0, Snapshot::len) + processes.as_ref().map_or(0, Snapshot::len),
        );
        Baseline { windows, processes }
    }

    /// Handles in a domain matching its rule right now
    pub fn matches(&self, domain: Domain) -> BTreeSet<Handle> {
        match domain {
            Domain::Window => match_windows(self.window_system.as_ref(), &self.windows),
            Domain::Process => match_processes(self.process_table.as_ref(), &self.processes),
        }
    }

    /// Current matches, restricted to new handles when a baseline is given
    ///
    /// With a baseline, a domain whose pre-snapshot is missing gets no targets
    /// rather than treating every resource as new.
    pub fn targets(&self, baseline: Option<&Baseline>) -> Targets {
        let select = |domain: Domain| -> BTreeSet<Handle> {
            if !self.matcher(domain).is_enabled() {
                return BTreeSet::new();
            }
            let post = self.matches(domain);
            match baseline {
                None => post,
                Some(baseline) => match baseline.get(domain) {
                    Some(pre) => diff(pre.handles(), &post),
                    None => {
                        warn!(domain = %domain, "no baseline, leaving domain untouched");
                        BTreeSet::new()
                    }
                },
            }
        };

        Targets {
            windows: select(Domain::Window),
            processes: select(Domain::Process),
        }
    }

    /// Compute targets and shut them down
    pub fn reconcile(&self, baseline: Option<&Baseline>) -> Teardown {
        let phase = span_phase("teardown");
        let _entered = phase.enter();

        let targets = self.targets(baseline);
        phase.record_items(targets.windows.len() + targets.processes.len());

        let windows = close_windows(self.window_system.as_ref(), &targets.windows);
        let processes =
            terminate_processes(self.process_table.as_ref(), &targets.processes, self.exit_timeout);

        info!(
            windows = targets.windows.len(),
            processes = targets.processes.len(),
            closed = windows.closed,
            terminated = processes.terminated,
            killed = processes.killed,
            "teardown complete"
        );

        Teardown {
            targets,
            windows,
            processes,
        }
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("windows", &self.windows)
            .field("processes", &self.processes)
            .field("exit_timeout", &self.exit_timeout)
            .finish()
    }
}
