//! Text injection into the focused application.
//!
//! Delivery is attempted in two tactics:
//!
//! 1. **Clipboard paste** - replace the clipboard with the text, release a
//!    possibly still held Alt, then send Ctrl+V.
//! 2. **Unicode typing** - only when the paste tactic fails, send one
//!    down/up pair per UTF-16 code unit through the OS Unicode input channel.
//!
//! Failures are absorbed here. The OS never tells us whether the target
//! accepted the text, so the returned [`InjectOutcome`] only describes what
//! the OS accepted and is used for diagnostics.
//!
//! The previous clipboard contents are not restored.

#[cfg(test)]
pub mod fakes;
#[cfg(windows)]
pub mod win32;

use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by the paste tactic. All of them trigger the typing fallback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InjectError {
    /// Another process holds the clipboard.
    #[error("clipboard is held by another process")]
    ClipboardBusy,

    /// The clipboard was opened but the text could not be installed.
    #[error("cannot install clipboard text: {0}")]
    ClipboardWrite(String),

    /// The OS accepted fewer synthetic key events than were submitted.
    #[error("input channel accepted {accepted} of {submitted} key events")]
    InputRejected {
        /// Events the OS accepted
        accepted: usize,
        /// Events submitted
        submitted: usize,
    },
}

/// Virtual keys used by the paste chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualKey {
    /// Either Alt key
    Alt,
    /// Either Ctrl key
    Control,
    /// The V key
    V,
}

/// A single synthetic keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStroke {
    /// Virtual key pressed
    Press(VirtualKey),
    /// Virtual key released
    Release(VirtualKey),
    /// Unicode code unit pressed, bypassing the keyboard layout
    UnitDown(u16),
    /// Unicode code unit released
    UnitUp(u16),
}

/// Alt-up sent before the chord, since the trigger itself was an Alt chord.
const RELEASE_ALT: [KeyStroke; 1] = [KeyStroke::Release(VirtualKey::Alt)];

/// Ctrl+V with Ctrl released last.
const PASTE_CHORD: [KeyStroke; 4] = [
    KeyStroke::Press(VirtualKey::Control),
    KeyStroke::Press(VirtualKey::V),
    KeyStroke::Release(VirtualKey::V),
    KeyStroke::Release(VirtualKey::Control),
];

/// Exclusive, short-lived access to the system clipboard.
pub trait Clipboard {
    /// Acquire the clipboard without blocking, clear it, install `text` as
    /// Unicode text and release it again. Ownership of the installed buffer
    /// passes to the OS.
    fn replace_text(&mut self, text: &str) -> Result<(), InjectError>;
}

/// The OS global synthetic input channel.
pub trait InputSink {
    /// Submit `strokes` in order and return how many the OS accepted.
    fn send(&mut self, strokes: &[KeyStroke]) -> usize;
}

/// What the injector managed to hand to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// Nothing to inject.
    Skipped,
    /// Text installed on the clipboard and Ctrl+V accepted.
    Pasted,
    /// Paste failed; text was typed unit by unit.
    Typed {
        /// Key events accepted by the OS
        accepted: usize,
        /// Key events submitted
        submitted: usize,
    },
}

/// Delivers text through a clipboard and an input channel.
pub struct Injector<C, I> {
    /// Clipboard used by the paste tactic
    clipboard: C,
    /// Synthetic keyboard input channel
    input: I,
}

impl<C: Clipboard, I: InputSink> Injector<C, I> {
    /// Create an injector over the given OS side channels.
    pub const fn new(clipboard: C, input: I) -> Self {
        Self { clipboard, input }
    }

    /// Inject `text` into whatever application has input focus.
    pub fn inject(&mut self, text: &str) -> InjectOutcome {
        if text.is_empty() {
            return InjectOutcome::Skipped;
        }

        match self.paste(text) {
            Ok(()) => {
                debug!("Pasted {} chars", text.chars().count());
                InjectOutcome::Pasted
            }
            Err(e) => {
                debug!("Paste failed ({}), typing instead", e);
                let outcome = self.type_units(text);
                if let InjectOutcome::Typed {
                    accepted,
                    submitted,
                } = outcome
                    && accepted < submitted
                {
                    warn!(
                        "Input channel accepted {} of {} key events",
                        accepted, submitted
                    );
                }
                outcome
            }
        }
    }

    /// Clipboard-paste tactic.
    fn paste(&mut self, text: &str) -> Result<(), InjectError> {
        self.clipboard.replace_text(text)?;

        // The Alt-up is best effort; only the chord itself decides success.
        let _ = self.input.send(&RELEASE_ALT);

        let accepted = self.input.send(&PASTE_CHORD);
        if accepted == PASTE_CHORD.len() {
            Ok(())
        } else {
            Err(InjectError::InputRejected {
                accepted,
                submitted: PASTE_CHORD.len(),
            })
        }
    }

    /// Per-code-unit Unicode typing tactic.
    fn type_units(&mut self, text: &str) -> InjectOutcome {
        let mut accepted = 0;
        let mut submitted = 0;
        for unit in text.encode_utf16() {
            let pair = [KeyStroke::UnitDown(unit), KeyStroke::UnitUp(unit)];
            submitted += pair.len();
            accepted += self.input.send(&pair);
        }
        InjectOutcome::Typed {
            accepted,
            submitted,
        }
    }
}
