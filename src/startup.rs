//! Run-at-login registration through the HKCU `Run` key.

use anyhow::{Context, Result};
use tracing::info;
use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
use windows::Win32::System::Registry::{
    HKEY_CURRENT_USER, REG_SZ, RegDeleteKeyValueW, RegSetKeyValueW,
};
use windows::core::{PCWSTR, w};

/// Key holding per-user login programs.
const RUN_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");

/// Value name under [`RUN_KEY`].
const VALUE_NAME: PCWSTR = w!("AutoInput");

/// Add or remove the quoted path of this executable under the `Run` key.
pub fn set_run_at_startup(enabled: bool) -> Result<()> {
    if enabled {
        register()
    } else {
        unregister()
    }
}

/// Write the `Run` value.
fn register() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to resolve executable path")?;
    let command: Vec<u16> = format!("\"{}\"", exe.display())
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();
    let bytes = u32::try_from(std::mem::size_of_val(command.as_slice()))
        .context("Executable path too long")?;

    // SAFETY: `command` is a NUL-terminated UTF-16 buffer of `bytes` bytes
    // that outlives the call; both names are static wide strings.
    unsafe {
        RegSetKeyValueW(
            HKEY_CURRENT_USER,
            RUN_KEY,
            VALUE_NAME,
            REG_SZ.0,
            Some(command.as_ptr().cast()),
            bytes,
        )
    }
    .ok()
    .context("Failed to write Run registry value")?;

    info!("Registered to start with Windows: {}", exe.display());
    Ok(())
}

/// Delete the `Run` value. A value that is already gone is fine.
fn unregister() -> Result<()> {
    // SAFETY: both names are static wide strings.
    let status = unsafe { RegDeleteKeyValueW(HKEY_CURRENT_USER, RUN_KEY, VALUE_NAME) };
    if status != ERROR_FILE_NOT_FOUND {
        status.ok().context("Failed to delete Run registry value")?;
    }
    info!("Removed start with Windows");
    Ok(())
}
