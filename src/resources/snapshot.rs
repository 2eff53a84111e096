/*!
 * Resource Snapshots
 * Immutable handle sets captured at one instant
 */

use super::traits::{ProcessTable, WindowSystem};
use super::types::{Domain, Handle};
use crate::errors::ResourceResult;
use std::collections::BTreeSet;

/// Handles of one domain at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    domain: Domain,
    handles: BTreeSet<Handle>,
}

impl Snapshot {
    pub fn new(domain: Domain, handles: impl IntoIterator<Item = Handle>) -> Self {
        Self {
            domain,
            handles: handles.into_iter().collect(),
        }
    }

    /// Capture every window currently listed
    pub fn windows(system: &dyn WindowSystem) -> ResourceResult<Self> {
        let windows = system.enumerate_windows()?;
        Ok(Self::new(Domain::Window, windows.into_iter().map(|w| w.handle)))
    }

    /// Capture every descendant process
    pub fn processes(table: &dyn ProcessTable) -> ResourceResult<Self> {
        Ok(Self::new(Domain::Process, table.child_pids()?))
    }

    #[inline]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[inline]
    pub fn handles(&self) -> &BTreeSet<Handle> {
        &self.handles
    }

    #[inline]
    pub fn contains(&self, handle: Handle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Handles present in `post` but not in `pre`
pub fn diff(pre: &BTreeSet<Handle>, post: &BTreeSet<Handle>) -> BTreeSet<Handle> {
    post.difference(pre).copied().collect()
}
