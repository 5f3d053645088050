//! Single-instance guard backed by a named mutex

use anyhow::{Context, Result};
use tracing::{debug, warn};
use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE};
use windows::Win32::System::Threading::CreateMutexW;
use windows::core::w;

/// Held for the process lifetime; a second process sees the mutex and exits.
pub struct SingleInstance {
    /// Mutex handle, closed on drop
    handle: HANDLE,
}

impl SingleInstance {
    /// Claim the instance mutex. `Ok(None)` means another instance owns it.
    pub fn acquire() -> Result<Option<Self>> {
        // SAFETY: default security, not initially owned, static name.
        let handle = unsafe { CreateMutexW(None, false, w!("Global\\AutoInput_SingleInstance")) }
            .context("Failed to create single-instance mutex")?;

        // SAFETY: read immediately after the CreateMutexW call on this thread.
        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            // SAFETY: handle was returned by CreateMutexW above.
            if let Err(e) = unsafe { CloseHandle(handle) } {
                warn!("CloseHandle failed: {}", e);
            }
            return Ok(None);
        }

        debug!("Single-instance mutex acquired");
        Ok(Some(Self { handle }))
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        // SAFETY: handle is owned by this guard and closed exactly once.
        if let Err(e) = unsafe { CloseHandle(self.handle) } {
            warn!("CloseHandle failed: {}", e);
        }
    }
}
