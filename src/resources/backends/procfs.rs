/*!
 * Linux Process Table
 *
 * Walks `/proc` for descendants of a root process and signals them with
 * SIGTERM / SIGKILL. Zombies count as exited: they are not reaped here,
 * since the work unit may still own a `Child` for them.
 */

use crate::errors::{ResourceError, ResourceResult};
use crate::limits::PROCESS_WAIT_POLL;
use crate::resources::traits::ProcessTable;
use crate::resources::types::{Handle, ProcessInfo};
use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid as NixPid;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Process table over `/proc`
#[derive(Debug, Clone)]
pub struct ProcProcessTable {
    root: u32,
    proc_root: PathBuf,
}

impl ProcProcessTable {
    /// Descendants of the current process
    pub fn new() -> Self {
        Self::rooted_at(std::process::id())
    }

    /// Descendants of an arbitrary process
    pub fn rooted_at(root: u32) -> Self {
        Self {
            root,
            proc_root: PathBuf::from("/proc"),
        }
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    fn entry(&self, pid: u64, file: &str) -> PathBuf {
        self.proc_root.join(pid.to_string()).join(file)
    }

    /// Parent pid and state letter from `/proc/<pid>/stat`
    fn stat(&self, pid: u64) -> io::Result<(u64, char)> {
        let raw = fs::read_to_string(self.entry(pid, "stat"))?;
        parse_stat(&raw).ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed stat"))
    }

    fn is_alive(&self, handle: Handle) -> bool {
        match self.stat(handle.raw()) {
            Ok((_, state)) => state != 'Z' && state != 'X',
            Err(_) => false,
        }
    }

    fn signal(&self, handle: Handle, signal: Signal) -> ResourceResult<()> {
        let raw = i32::try_from(handle.raw()).map_err(|_| ResourceError::NoSuchResource(handle))?;
        match kill(NixPid::from_raw(raw), signal) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(ResourceError::NoSuchResource(handle)),
            Err(Errno::EPERM) => Err(ResourceError::AccessDenied(handle)),
            Err(e) => Err(ResourceError::Io(e.to_string())),
        }
    }
}

impl Default for ProcProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `(ppid, state)` from a stat line
///
/// The command name sits in parentheses and may itself contain spaces or
/// parentheses, so fields are read after the last `)`.
pub fn parse_stat(raw: &str) -> Option<(u64, char)> {
    let rest = &raw[raw.rfind(')')? + 1..];
    let mut fields = rest.split_whitespace();
    let state = fields.next()?.chars().next()?;
    let ppid = fields.next()?.parse().ok()?;
    Some((ppid, state))
}

fn map_io(handle: Handle, e: io::Error) -> ResourceError {
    match e.kind() {
        io::ErrorKind::NotFound => ResourceError::NoSuchResource(handle),
        io::ErrorKind::PermissionDenied => ResourceError::AccessDenied(handle),
        _ => ResourceError::Io(e.to_string()),
    }
}

impl ProcessTable for ProcProcessTable {
    fn child_pids(&self) -> ResourceResult<Vec<Handle>> {
        let dir = fs::read_dir(&self.proc_root)
            .map_err(|e| ResourceError::Unavailable(format!("{}: {}", self.proc_root.display(), e)))?;

        let mut children: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for entry in dir.flatten() {
            let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse::<u64>().ok()) else {
                continue;
            };
            // Processes exiting mid-walk simply drop out
            if let Ok((ppid, _)) = self.stat(pid) {
                children.entry(ppid).or_default().push(pid);
            }
        }

        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([self.root as u64]);
        while let Some(parent) = queue.pop_front() {
            for &child in children.get(&parent).into_iter().flatten() {
                if child != self.root as u64 && seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        Ok(seen.into_iter().map(Handle).collect())
    }

    fn inspect(&self, handle: Handle) -> ResourceResult<ProcessInfo> {
        let pid = handle.raw();
        let name = fs::read_to_string(self.entry(pid, "comm")).map_err(|e| map_io(handle, e))?;
        let cmdline = fs::read(self.entry(pid, "cmdline")).map_err(|e| map_io(handle, e))?;

        let args = cmdline
            .split(|b| *b == 0)
            .filter(|arg| !arg.is_empty())
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();

        Ok(ProcessInfo::new(handle, name.trim_end().to_string(), args))
    }

    fn terminate_process(&self, handle: Handle) -> ResourceResult<()> {
        debug!("Sending SIGTERM to {}", handle);
        self.signal(handle, Signal::SIGTERM)
    }

    fn wait_process(&self, handle: Handle, timeout: Duration) -> ResourceResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_alive(handle) {
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ResourceError::TimeoutExpired {
                    handle,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            std::thread::sleep(PROCESS_WAIT_POLL.min(deadline - now));
        }
    }

    fn kill_process(&self, handle: Handle) -> ResourceResult<()> {
        warn!("Sending SIGKILL to {}", handle);
        self.signal(handle, Signal::SIGKILL)
    }
}
