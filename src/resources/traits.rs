/*!
 * Resource Backend Traits
 * Enumeration and shutdown capabilities for each resource domain
 */

use super::types::{Handle, ProcessInfo, WindowInfo};
use crate::errors::ResourceResult;
use std::time::Duration;

/// Window enumeration capability
pub trait WindowSystem: Send + Sync {
    /// List top-level windows
    fn enumerate_windows(&self) -> ResourceResult<Vec<WindowInfo>>;

    /// Ask a window to close
    fn close_window(&self, handle: Handle) -> ResourceResult<()>;
}

/// Process enumeration capability, scoped to descendants of this process
pub trait ProcessTable: Send + Sync {
    /// Handles of all descendant processes (recursive)
    fn child_pids(&self) -> ResourceResult<Vec<Handle>>;

    /// Name and command line of one process
    fn inspect(&self, handle: Handle) -> ResourceResult<ProcessInfo>;

    /// Every descendant with its own inspection result
    ///
    /// A failure for one process does not affect the others.
    fn enumerate_child_processes(&self) -> ResourceResult<Vec<ResourceResult<ProcessInfo>>> {
        Ok(self
            .child_pids()?
            .into_iter()
            .map(|handle| self.inspect(handle))
            .collect())
    }

    /// Graceful termination request (SIGTERM on Unix)
    fn terminate_process(&self, handle: Handle) -> ResourceResult<()>;

    /// Wait for exit; `TimeoutExpired` if still alive after `timeout`
    fn wait_process(&self, handle: Handle, timeout: Duration) -> ResourceResult<()>;

    /// Forceful kill (SIGKILL on Unix)
    fn kill_process(&self, handle: Handle) -> ResourceResult<()>;
}
