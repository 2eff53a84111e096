/*!
 * Resource Types
 * Handles, domains, and the descriptions backends report
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle for a window id or a process id
///
/// A handle is only meaningful inside the domain that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub u64);

impl Handle {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Self(raw as u64)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class of OS-level entities subject to matching and termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Window,
    Process,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Process => "process",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level window as reported by a window system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub handle: Handle,
    pub title: String,
}

impl WindowInfo {
    pub fn new(handle: impl Into<Handle>, title: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            title: title.into(),
        }
    }
}

/// A descendant process as reported by a process table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub handle: Handle,
    pub name: String,
    pub cmdline: Vec<String>,
}

impl ProcessInfo {
    pub fn new(handle: impl Into<Handle>, name: impl Into<String>, cmdline: Vec<String>) -> Self {
        Self {
            handle: handle.into(),
            name: name.into(),
            cmdline,
        }
    }

    /// Command line joined with single spaces
    pub fn command_line(&self) -> String {
        self.cmdline.join(" ")
    }
}
