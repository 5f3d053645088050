//! Win32 clipboard and `SendInput` backends for the injector.

use std::mem;
use std::ptr;

use tracing::debug;
use windows::Win32::Foundation::{HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{
    GMEM_MOVEABLE, GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock,
};
use windows::Win32::System::Ole::CF_UNICODETEXT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, SendInput, VIRTUAL_KEY, VK_CONTROL, VK_MENU, VK_V,
};

use super::{Clipboard, InjectError, InputSink, KeyStroke, VirtualKey};

/// Size of one `INPUT` record, as `SendInput` expects it.
#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "INPUT is a few dozen bytes"
)]
const INPUT_SIZE: i32 = mem::size_of::<INPUT>() as i32;

/// The system clipboard, opened for the duration of a single write.
#[derive(Debug, Default)]
pub struct Win32Clipboard;

impl Win32Clipboard {
    /// Create the clipboard backend.
    pub const fn new() -> Self {
        Self
    }
}

impl Clipboard for Win32Clipboard {
    fn replace_text(&mut self, text: &str) -> Result<(), InjectError> {
        let mut units: Vec<u16> = text.encode_utf16().collect();
        units.push(0);

        let _open = OpenClipboardGuard::acquire()?;

        // SAFETY: the clipboard is open on this thread for the guard's lifetime.
        unsafe { EmptyClipboard() }.map_err(|e| InjectError::ClipboardWrite(e.to_string()))?;

        GlobalText::copy_of(&units)?.install()
    }
}

/// Holds the clipboard open and closes it on every exit path.
struct OpenClipboardGuard;

impl OpenClipboardGuard {
    /// Single non-blocking attempt to open the clipboard.
    fn acquire() -> Result<Self, InjectError> {
        // SAFETY: no owner window is associated; OpenClipboard either succeeds
        // or fails immediately when another process holds the clipboard.
        match unsafe { OpenClipboard(None) } {
            Ok(()) => Ok(Self),
            Err(e) => {
                debug!("OpenClipboard failed: {}", e);
                Err(InjectError::ClipboardBusy)
            }
        }
    }
}

impl Drop for OpenClipboardGuard {
    fn drop(&mut self) {
        // SAFETY: constructed only after OpenClipboard succeeded on this thread.
        if let Err(e) = unsafe { CloseClipboard() } {
            debug!("CloseClipboard failed: {}", e);
        }
    }
}

/// A movable global memory block holding NUL-terminated UTF-16 text.
///
/// Freed on drop unless the clipboard took ownership of it.
struct GlobalText {
    /// Block handle; `None` once owned by the clipboard
    handle: Option<HGLOBAL>,
}

impl GlobalText {
    /// Allocate a block and copy `units` into it.
    fn copy_of(units: &[u16]) -> Result<Self, InjectError> {
        // SAFETY: plain allocation; the handle is owned by the returned value.
        let handle = unsafe { GlobalAlloc(GMEM_MOVEABLE, mem::size_of_val(units)) }
            .map_err(|e| InjectError::ClipboardWrite(e.to_string()))?;
        let block = Self {
            handle: Some(handle),
        };

        // SAFETY: handle is a live movable block allocated above.
        let dst = unsafe { GlobalLock(handle) }.cast::<u16>();
        if dst.is_null() {
            return Err(InjectError::ClipboardWrite("GlobalLock failed".to_owned()));
        }
        // SAFETY: the block holds exactly units.len() u16 values and does not
        // overlap the source slice.
        unsafe { ptr::copy_nonoverlapping(units.as_ptr(), dst, units.len()) };
        // SAFETY: balances the GlobalLock above. A zero return with no error
        // just means the lock count reached zero.
        let _ = unsafe { GlobalUnlock(handle) };

        Ok(block)
    }

    /// Hand the block to the open clipboard as `CF_UNICODETEXT`.
    fn install(mut self) -> Result<(), InjectError> {
        let Some(handle) = self.handle else {
            return Err(InjectError::ClipboardWrite("block already released".to_owned()));
        };
        // SAFETY: the clipboard is open and emptied by the caller; on success
        // the system owns the block and we must not free it.
        unsafe { SetClipboardData(u32::from(CF_UNICODETEXT.0), Some(HANDLE(handle.0))) }
            .map_err(|e| InjectError::ClipboardWrite(e.to_string()))?;
        self.handle = None;
        Ok(())
    }
}

impl Drop for GlobalText {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: the block was never handed to the clipboard.
            if let Err(e) = unsafe { GlobalFree(Some(handle)) } {
                debug!("GlobalFree failed: {}", e);
            }
        }
    }
}

/// Synthetic keyboard input through `SendInput`.
#[derive(Debug, Default)]
pub struct SendInputSink;

impl SendInputSink {
    /// Create the input backend.
    pub const fn new() -> Self {
        Self
    }
}

impl InputSink for SendInputSink {
    fn send(&mut self, strokes: &[KeyStroke]) -> usize {
        let inputs: Vec<INPUT> = strokes.iter().copied().map(keyboard_input).collect();
        // SAFETY: every record is a fully initialised keyboard INPUT and
        // INPUT_SIZE matches the record type.
        let accepted = unsafe { SendInput(&inputs, INPUT_SIZE) };
        usize::try_from(accepted).unwrap_or_default()
    }
}

/// Win32 virtual-key code for a [`VirtualKey`].
const fn virtual_key(key: VirtualKey) -> VIRTUAL_KEY {
    match key {
        VirtualKey::Alt => VK_MENU,
        VirtualKey::Control => VK_CONTROL,
        VirtualKey::V => VK_V,
    }
}

/// Build the `INPUT` record for one stroke.
fn keyboard_input(stroke: KeyStroke) -> INPUT {
    let (vk, scan, flags) = match stroke {
        KeyStroke::Press(key) => (virtual_key(key), 0, KEYBD_EVENT_FLAGS(0)),
        KeyStroke::Release(key) => (virtual_key(key), 0, KEYEVENTF_KEYUP),
        KeyStroke::UnitDown(unit) => (VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
        KeyStroke::UnitUp(unit) => (VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
    };
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Read back the keyboard half of an INPUT record.
    fn fields(input: &INPUT) -> (VIRTUAL_KEY, u16, KEYBD_EVENT_FLAGS) {
        assert_eq!(input.r#type, INPUT_KEYBOARD);
        // SAFETY: keyboard_input only ever fills the `ki` variant.
        let ki = unsafe { input.Anonymous.ki };
        (ki.wVk, ki.wScan, ki.dwFlags)
    }

    #[test]
    fn virtual_strokes_use_virtual_keys() {
        let down = keyboard_input(KeyStroke::Press(VirtualKey::Control));
        assert_eq!(fields(&down), (VK_CONTROL, 0, KEYBD_EVENT_FLAGS(0)));

        let up = keyboard_input(KeyStroke::Release(VirtualKey::Alt));
        assert_eq!(fields(&up), (VK_MENU, 0, KEYEVENTF_KEYUP));
    }

    #[test]
    fn unit_strokes_carry_the_code_unit() {
        let down = keyboard_input(KeyStroke::UnitDown(0x4F60));
        assert_eq!(fields(&down), (VIRTUAL_KEY(0), 0x4F60, KEYEVENTF_UNICODE));

        let up = keyboard_input(KeyStroke::UnitUp(0x4F60));
        assert_eq!(
            fields(&up),
            (VIRTUAL_KEY(0), 0x4F60, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP)
        );
    }
}
