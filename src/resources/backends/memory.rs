/*!
 * In-Memory Backends
 *
 * Scriptable window system and process table that record every call. Used by
 * the test suite and for dry runs where nothing real should be touched.
 */

use crate::errors::{ResourceError, ResourceResult};
use crate::resources::traits::{ProcessTable, WindowSystem};
use crate::resources::types::{Handle, ProcessInfo, WindowInfo};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct WindowState {
    open: BTreeMap<Handle, String>,
    closed: Vec<Handle>,
    enumerations: usize,
    fail_enumeration: bool,
}

/// Window system backed by a map; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryWindows {
    state: Arc<Mutex<WindowState>>,
}

impl InMemoryWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a window
    pub fn open(&self, handle: impl Into<Handle>, title: impl Into<String>) {
        self.state.lock().open.insert(handle.into(), title.into());
    }

    pub fn is_open(&self, handle: impl Into<Handle>) -> bool {
        self.state.lock().open.contains_key(&handle.into())
    }

    /// Handles passed to `close_window`, in call order
    pub fn close_calls(&self) -> Vec<Handle> {
        self.state.lock().closed.clone()
    }

    pub fn enumerations(&self) -> usize {
        self.state.lock().enumerations
    }

    /// Make every subsequent enumeration fail
    pub fn fail_enumeration(&self, fail: bool) {
        self.state.lock().fail_enumeration = fail;
    }
}

impl WindowSystem for InMemoryWindows {
    fn enumerate_windows(&self) -> ResourceResult<Vec<WindowInfo>> {
        let mut state = self.state.lock();
        state.enumerations += 1;
        if state.fail_enumeration {
            return Err(ResourceError::Unavailable("window listing disabled".into()));
        }
        Ok(state
            .open
            .iter()
            .map(|(handle, title)| WindowInfo::new(*handle, title.clone()))
            .collect())
    }

    fn close_window(&self, handle: Handle) -> ResourceResult<()> {
        let mut state = self.state.lock();
        state.closed.push(handle);
        state
            .open
            .remove(&handle)
            .map(|_| ())
            .ok_or(ResourceError::NoSuchResource(handle))
    }
}

/// Calls recorded by `InMemoryProcesses`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessCall {
    Terminate(Handle),
    Wait(Handle, Duration),
    Kill(Handle),
}

#[derive(Debug, Clone)]
struct FakeProcess {
    name: String,
    cmdline: Vec<String>,
    ignores_terminate: bool,
    hidden: bool,
}

#[derive(Debug, Default)]
struct ProcessState {
    live: BTreeMap<Handle, FakeProcess>,
    calls: Vec<ProcessCall>,
}

/// Process table backed by a map; clones share state
///
/// `wait_process` never sleeps: it reports `TimeoutExpired` at once for a
/// process still alive.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcesses {
    state: Arc<Mutex<ProcessState>>,
}

impl InMemoryProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a process that exits on terminate
    pub fn spawn(&self, handle: impl Into<Handle>, name: impl Into<String>, cmdline: &[&str]) {
        self.insert(handle.into(), name.into(), cmdline, false);
    }

    /// Add a process that ignores terminate and needs a kill
    pub fn spawn_stubborn(&self, handle: impl Into<Handle>, name: impl Into<String>, cmdline: &[&str]) {
        self.insert(handle.into(), name.into(), cmdline, true);
    }

    fn insert(&self, handle: Handle, name: String, cmdline: &[&str], ignores_terminate: bool) {
        self.state.lock().live.insert(
            handle,
            FakeProcess {
                name,
                cmdline: cmdline.iter().map(|s| s.to_string()).collect(),
                ignores_terminate,
                hidden: false,
            },
        );
    }

    /// Make inspection of a process fail with `AccessDenied`
    pub fn deny_inspection(&self, handle: impl Into<Handle>) {
        if let Some(p) = self.state.lock().live.get_mut(&handle.into()) {
            p.hidden = true;
        }
    }

    /// Remove a process without going through the table
    pub fn exit(&self, handle: impl Into<Handle>) {
        self.state.lock().live.remove(&handle.into());
    }

    pub fn is_alive(&self, handle: impl Into<Handle>) -> bool {
        self.state.lock().live.contains_key(&handle.into())
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.state.lock().calls.clone()
    }
}

impl ProcessTable for InMemoryProcesses {
    fn child_pids(&self) -> ResourceResult<Vec<Handle>> {
        Ok(self.state.lock().live.keys().copied().collect())
    }

    fn inspect(&self, handle: Handle) -> ResourceResult<ProcessInfo> {
        let state = self.state.lock();
        let process = state
            .live
            .get(&handle)
            .ok_or(ResourceError::NoSuchResource(handle))?;
        if process.hidden {
            return Err(ResourceError::AccessDenied(handle));
        }
        Ok(ProcessInfo::new(handle, process.name.clone(), process.cmdline.clone()))
    }

    fn terminate_process(&self, handle: Handle) -> ResourceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(ProcessCall::Terminate(handle));
        let stubborn = state
            .live
            .get(&handle)
            .map(|p| p.ignores_terminate)
            .ok_or(ResourceError::NoSuchResource(handle))?;
        if !stubborn {
            state.live.remove(&handle);
        }
        Ok(())
    }

    fn wait_process(&self, handle: Handle, timeout: Duration) -> ResourceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(ProcessCall::Wait(handle, timeout));
        if state.live.contains_key(&handle) {
            Err(ResourceError::TimeoutExpired {
                handle,
                timeout_ms: timeout.as_millis() as u64,
            })
        } else {
            Ok(())
        }
    }

    fn kill_process(&self, handle: Handle) -> ResourceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(ProcessCall::Kill(handle));
        state
            .live
            .remove(&handle)
            .map(|_| ())
            .ok_or(ResourceError::NoSuchResource(handle))
    }
}
