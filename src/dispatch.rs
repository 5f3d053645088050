//! Trigger dispatch and the state shared with the UI.
//!
//! The event loop owns one [`AppContext`] and one [`Dispatcher`] and feeds
//! every [`AppEvent`] through [`Dispatcher::handle`], one at a time. Nothing
//! here is shared across threads.

use tracing::{debug, info};

use crate::inject::{Clipboard, InjectOutcome, Injector, InputSink};
use crate::snippets::{SLOT_COUNT, Slot, SnippetStore};
use crate::trigger;

/// Enable gate plus the nine snippets, as loaded from or saved to settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Whether triggers inject anything at all
    pub enabled: bool,
    /// Snippet per slot, in slot order
    pub snippets: [String; SLOT_COUNT],
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: true,
            snippets: Default::default(),
        }
    }
}

/// Actions from the tray that need the platform shell to act on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Open the settings file for editing
    EditSnippets,
    /// Re-read the settings file
    ReloadSnippets,
    /// Set whether the app starts with Windows
    SetStartup(bool),
    /// Exit the process
    Quit,
}

/// Everything the event loop processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A registered trigger fired; carries the OS trigger id
    TriggerFired(u32),
    /// New gate and snippets were saved
    ConfigurationSaved(Configuration),
    /// The enable gate was flipped
    EnableToggled(bool),
    /// A tray menu entry was activated
    TrayActivated(TrayAction),
}

/// What the shell must do after the core handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The gate changed; reflect it in the tray, and write it to the
    /// settings file when `persist` is set
    GateChanged {
        /// New gate
        enabled: bool,
        /// Whether the change came from the user rather than the file
        persist: bool,
    },
    /// A tray action that needs platform glue
    Tray(TrayAction),
}

/// Snippets and enable gate, owned by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    /// Snippet table
    store: SnippetStore,
    /// Enable gate
    enabled: bool,
}

impl AppContext {
    /// Context initialised from a loaded configuration.
    pub fn new(configuration: Configuration) -> Self {
        Self {
            store: SnippetStore::new(configuration.snippets),
            enabled: configuration.enabled,
        }
    }

    /// Current enable gate.
    pub const fn current_enable_state(&self) -> bool {
        self.enabled
    }

    /// Copy of every snippet, for populating editors.
    pub fn current_snippets(&self) -> [String; SLOT_COUNT] {
        self.store.snapshot()
    }

    /// Current gate and snippets as one value.
    pub fn configuration(&self) -> Configuration {
        Configuration {
            enabled: self.enabled,
            snippets: self.current_snippets(),
        }
    }

    /// Replace the gate and all nine snippets in one step.
    pub fn apply_configuration(&mut self, enabled: bool, snippets: [String; SLOT_COUNT]) {
        self.enabled = enabled;
        self.store.set_all(snippets);
        info!(
            "Configuration applied: enabled={}, {} bound slot(s)",
            enabled,
            self.store.bound_count()
        );
    }

    /// Flip the enable gate without touching the snippets.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!("Auto input {}", if enabled { "enabled" } else { "disabled" });
    }

    /// The snippet that would be injected for `slot`.
    pub fn snippet(&self, slot: Slot) -> &str {
        self.store.get(slot)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

/// Dispatcher state. `Dispatching` only lasts for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for the next event
    Idle,
    /// Injecting the snippet of a fired trigger
    Dispatching(Slot),
}

/// Turns trigger events into injections.
pub struct Dispatcher<C, I> {
    /// Text delivery
    injector: Injector<C, I>,
    /// Current state
    state: DispatchState,
}

impl<C: Clipboard, I: InputSink> Dispatcher<C, I> {
    /// Create an idle dispatcher.
    pub const fn new(injector: Injector<C, I>) -> Self {
        Self {
            injector,
            state: DispatchState::Idle,
        }
    }

    /// Current state.
    #[cfg(test)]
    pub const fn state(&self) -> DispatchState {
        self.state
    }

    /// Process one event and report what the shell still has to do.
    ///
    /// A toggle from the tray is persisted. A saved configuration already
    /// came from the settings file, so only the tray is updated.
    pub fn handle(&mut self, ctx: &mut AppContext, event: AppEvent) -> Option<Effect> {
        match event {
            AppEvent::TriggerFired(id) => {
                self.on_trigger(ctx, id);
                None
            }
            AppEvent::ConfigurationSaved(configuration) => {
                let enabled = configuration.enabled;
                ctx.apply_configuration(enabled, configuration.snippets);
                Some(Effect::GateChanged {
                    enabled,
                    persist: false,
                })
            }
            AppEvent::EnableToggled(enabled) => {
                ctx.set_enabled(enabled);
                Some(Effect::GateChanged {
                    enabled,
                    persist: true,
                })
            }
            AppEvent::TrayActivated(action) => Some(Effect::Tray(action)),
        }
    }

    /// Resolve, gate, snapshot and inject. Returns `None` when the trigger
    /// was ignored.
    pub fn on_trigger(&mut self, ctx: &AppContext, id: u32) -> Option<InjectOutcome> {
        let Some(slot) = trigger::resolve(id) else {
            debug!("Ignoring unknown trigger id {}", id);
            return None;
        };

        if !ctx.current_enable_state() {
            debug!("{} ignored, auto input is disabled", slot);
            return None;
        }

        let payload = ctx.snippet(slot).to_owned();

        self.state = DispatchState::Dispatching(slot);
        let outcome = self.injector.inject(&payload);
        self.state = DispatchState::Idle;

        debug!("{} dispatched: {:?}", slot, outcome);
        Some(outcome)
    }
}
