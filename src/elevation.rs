//! Relaunch with administrator rights so input reaches elevated windows.

use anyhow::{Context, Result};
use tracing::{info, warn};
use windows::Win32::UI::Shell::{IsUserAnAdmin, ShellExecuteW};
use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;
use windows::core::{PCWSTR, w};

/// Values at or below this from `ShellExecuteW` are error codes.
const SHELL_EXECUTE_ERROR_MAX: usize = 32;

/// Privilege level this process ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Already running as administrator
    Elevated,
    /// An elevated copy was started; this process should exit
    Relaunched,
    /// Elevation was declined or failed; keep running as is
    Unelevated,
}

/// Start an elevated copy of this executable unless already elevated.
pub fn relaunch_as_admin_if_needed() -> Elevation {
    // SAFETY: no arguments; reads the token of the current process.
    if unsafe { IsUserAnAdmin() }.as_bool() {
        return Elevation::Elevated;
    }

    match relaunch() {
        Ok(()) => {
            info!("Started elevated instance");
            Elevation::Relaunched
        }
        Err(e) => {
            warn!("{:#}; continuing without administrator rights", e);
            Elevation::Unelevated
        }
    }
}

/// Ask the shell to run this executable with the `runas` verb.
fn relaunch() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to resolve executable path")?;
    let file: Vec<u16> = exe
        .as_os_str()
        .to_string_lossy()
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: `file` is a NUL-terminated UTF-16 buffer that outlives the
    // call; the verb is a static wide string.
    let result = unsafe {
        ShellExecuteW(
            None,
            w!("runas"),
            PCWSTR(file.as_ptr()),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOWNORMAL,
        )
    };

    let code = result.0.addr();
    if code <= SHELL_EXECUTE_ERROR_MAX {
        anyhow::bail!("Elevated relaunch failed (code {})", code);
    }
    Ok(())
}
