/*!
 * Resource Backends
 * Concrete window systems and process tables
 */

mod memory;
#[cfg(target_os = "linux")]
mod procfs;
mod wmctrl;

pub use memory::{InMemoryProcesses, InMemoryWindows, ProcessCall};
#[cfg(target_os = "linux")]
pub use procfs::{parse_stat, ProcProcessTable};
pub use wmctrl::{parse_listing_line, WmctrlWindows};

use super::traits::{ProcessTable, WindowSystem};
use super::types::{Handle, ProcessInfo, WindowInfo};
use crate::errors::{ResourceError, ResourceResult};
use std::sync::Arc;
use std::time::Duration;

/// Backend for platforms without support; every call reports `Unavailable`
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl Unsupported {
    fn error() -> ResourceError {
        ResourceError::Unavailable(format!("not supported on {}", std::env::consts::OS))
    }
}

impl WindowSystem for Unsupported {
    fn enumerate_windows(&self) -> ResourceResult<Vec<WindowInfo>> {
        Err(Self::error())
    }

    fn close_window(&self, _handle: Handle) -> ResourceResult<()> {
        Err(Self::error())
    }
}

impl ProcessTable for Unsupported {
    fn child_pids(&self) -> ResourceResult<Vec<Handle>> {
        Err(Self::error())
    }

    fn inspect(&self, _handle: Handle) -> ResourceResult<ProcessInfo> {
        Err(Self::error())
    }

    fn terminate_process(&self, _handle: Handle) -> ResourceResult<()> {
        Err(Self::error())
    }

    fn wait_process(&self, _handle: Handle, _timeout: Duration) -> ResourceResult<()> {
        Err(Self::error())
    }

    fn kill_process(&self, _handle: Handle) -> ResourceResult<()> {
        Err(Self::error())
    }
}

/// Window system for this platform
pub fn platform_windows() -> Arc<dyn WindowSystem> {
    if cfg!(unix) && !cfg!(target_os = "macos") {
        Arc::new(WmctrlWindows::new())
    } else {
        Arc::new(Unsupported)
    }
}

/// Process table for this platform, rooted at the current process
pub fn platform_processes() -> Arc<dyn ProcessTable> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(ProcProcessTable::new())
    }

    #[cfg(not(target_os = "linux"))]
    {
        Arc::new(Unsupported)
    }
}
