//! In-memory clipboard and input channel for tests.
//!
//! Both fakes are cheap handles over shared state, so a test can keep one
//! clone while the injector owns another.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{Clipboard, InjectError, InputSink, KeyStroke};

/// State behind [`FakeClipboard`].
#[derive(Debug, Default)]
struct ClipboardState {
    /// Current clipboard text
    contents: Option<String>,
    /// Simulate another process holding the clipboard
    busy: bool,
    /// Simulate a failing install after a successful open
    fail_writes: bool,
    /// Number of successful installs
    writes: usize,
}

/// Clipboard that can be made busy or failing.
#[derive(Debug, Clone, Default)]
pub struct FakeClipboard {
    /// Shared state
    state: Rc<RefCell<ClipboardState>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_busy(&self, busy: bool) {
        self.state.borrow_mut().busy = busy;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.borrow_mut().fail_writes = fail;
    }

    pub fn contents(&self) -> Option<String> {
        self.state.borrow().contents.clone()
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }
}

impl Clipboard for FakeClipboard {
    fn replace_text(&mut self, text: &str) -> Result<(), InjectError> {
        let mut state = self.state.borrow_mut();
        if state.busy {
            return Err(InjectError::ClipboardBusy);
        }
        if state.fail_writes {
            return Err(InjectError::ClipboardWrite("out of memory".to_owned()));
        }
        state.contents = Some(text.to_owned());
        state.writes += 1;
        Ok(())
    }
}

/// State behind [`RecordingInput`].
#[derive(Debug, Default)]
struct InputState {
    /// Every stroke submitted, accepted or not
    strokes: Vec<KeyStroke>,
    /// Per-call acceptance counts consumed before falling back to the default
    script: VecDeque<usize>,
    /// Accept nothing once the script is exhausted
    reject_all: bool,
}

/// Input channel that records every submitted stroke.
#[derive(Debug, Clone, Default)]
pub struct RecordingInput {
    /// Shared state
    state: Rc<RefCell<InputState>>,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept exactly these counts for the next `send` calls, in order.
    pub fn script_acceptance(&self, counts: Vec<usize>) {
        self.state.borrow_mut().script = counts.into();
    }

    pub fn reject_all(&self, reject: bool) {
        self.state.borrow_mut().reject_all = reject;
    }

    pub fn strokes(&self) -> Vec<KeyStroke> {
        self.state.borrow().strokes.clone()
    }
}

impl InputSink for RecordingInput {
    fn send(&mut self, strokes: &[KeyStroke]) -> usize {
        let mut state = self.state.borrow_mut();
        state.strokes.extend_from_slice(strokes);
        match state.script.pop_front() {
            Some(count) => count.min(strokes.len()),
            None if state.reject_all => 0,
            None => strokes.len(),
        }
    }
}
