/*!
 * X11 Window System via `wmctrl`
 *
 * `wmctrl -l` lists managed windows; `wmctrl -i -c <id>` asks one to close
 * gracefully through the window manager.
 */

use crate::errors::{ResourceError, ResourceResult};
use crate::resources::traits::WindowSystem;
use crate::resources::types::{Handle, WindowInfo};
use log::debug;
use std::io;
use std::process::{Command, Stdio};

/// Window system backed by the `wmctrl` binary
#[derive(Debug, Clone)]
pub struct WmctrlWindows {
    program: String,
}

impl WmctrlWindows {
    pub fn new() -> Self {
        Self::with_program("wmctrl")
    }

    /// Use a different binary path
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null());
        cmd
    }

    fn spawn_error(&self, e: io::Error) -> ResourceError {
        match e.kind() {
            io::ErrorKind::NotFound => {
                ResourceError::Unavailable(format!("{} is not installed", self.program))
            }
            _ => ResourceError::Io(e.to_string()),
        }
    }
}

impl Default for WmctrlWindows {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one `wmctrl -l` line: `<id> <desktop> <host> <title...>`
pub fn parse_listing_line(line: &str) -> Option<WindowInfo> {
    let line = line.trim_end();
    let mut rest = line.trim_start();
    let mut fields = [""; 3];

    for field in fields.iter_mut() {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        *field = &rest[..end];
        rest = rest[end..].trim_start();
    }

    let id = fields[0].strip_prefix("0x")?;
    let handle = u64::from_str_radix(id, 16).ok()?;
    if fields[1].is_empty() {
        return None;
    }
    Some(WindowInfo::new(handle, rest))
}

impl WindowSystem for WmctrlWindows {
    fn enumerate_windows(&self) -> ResourceResult<Vec<WindowInfo>> {
        let output = self
            .command()
            .arg("-l")
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ResourceError::Unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(listing.lines().filter_map(parse_listing_line).collect())
    }

    fn close_window(&self, handle: Handle) -> ResourceResult<()> {
        let status = self
            .command()
            .args(["-i", "-c", &format!("{:#x}", handle.raw())])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.spawn_error(e))?;

        if status.success() {
            debug!("Requested close of window {:#x}", handle.raw());
            Ok(())
        } else {
            Err(ResourceError::NoSuchResource(handle))
        }
    }
}
