//! Application state and main event loop.
//!
//! Owns all runtime components. OS hotkey and tray notifications are turned
//! into [`AppEvent`]s on a single queue and processed one at a time, so the
//! snippet table and enable gate never need locking.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::process::Command;

use anyhow::{Context, Result};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{error, info, warn};

use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
};

use crate::config::Config;
use crate::dispatch::{AppContext, AppEvent, Dispatcher, Effect, TrayAction};
use crate::inject::Injector;
use crate::inject::win32::{SendInputSink, Win32Clipboard};
use crate::settings::{Settings, SettingsStore};
use crate::startup;
use crate::tray::TrayManager;
use crate::trigger::TriggerRegistration;

/// Holds all runtime components and drives the event loop.
pub struct App {
    /// System tray manager
    tray: TrayManager,
    /// Claim on Alt+1..Alt+9, released on drop
    triggers: TriggerRegistration<GlobalHotKeyManager>,
    /// Trigger to injection state machine
    dispatcher: Dispatcher<Win32Clipboard, SendInputSink>,
    /// Snippets and enable gate
    ctx: AppContext,
    /// Persisted settings file
    settings: SettingsStore,
    /// Whether the app is registered to start with Windows
    startup: bool,
    /// Pending events, processed in arrival order
    queue: VecDeque<AppEvent>,
}

impl App {
    /// Initialize all components from the provided configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let settings = SettingsStore::new(&config.settings_path);
        let Settings {
            configuration,
            startup,
        } = settings.load();

        if let Err(e) = startup::set_run_at_startup(startup) {
            warn!("Could not apply start with Windows setting: {:#}", e);
        }

        let tray = TrayManager::new(configuration.enabled, startup)
            .context("Failed to create system tray")?;
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        let triggers = TriggerRegistration::register_all(manager);
        if triggers.mask().is_empty() {
            warn!("No trigger could be registered; Alt+1..Alt+9 will do nothing");
        }
        let dispatcher = Dispatcher::new(Injector::new(
            Win32Clipboard::new(),
            SendInputSink::new(),
        ));
        let ctx = AppContext::new(configuration);

        info!(
            "Auto Input ready. {} trigger(s) active, {} snippet(s) bound.",
            triggers.mask().len(),
            ctx.current_snippets().iter().filter(|s| !s.is_empty()).count()
        );

        Ok(Self {
            tray,
            triggers,
            dispatcher,
            ctx,
            settings,
            startup,
            queue: VecDeque::new(),
        })
    }

    /// Run the event loop until the user requests quit.
    pub fn run(mut self) -> Result<()> {
        let receiver = GlobalHotKeyEvent::receiver();

        loop {
            Self::pump_messages();

            while let Ok(event) = receiver.try_recv() {
                if matches!(event.state, HotKeyState::Pressed) {
                    self.queue.push_back(AppEvent::TriggerFired(event.id));
                }
            }
            while let Some(event) = self.tray.poll_event() {
                self.queue.push_back(event);
            }

            while let Some(event) = self.queue.pop_front() {
                if self.process(event).is_break() {
                    info!("Quit requested");
                    self.triggers.unregister_all();
                    return Ok(());
                }
            }

            std::thread::sleep(std::time::Duration::from_millis(10));
        }
    }

    /// Handle one event, then carry out whatever the dispatcher hands back.
    fn process(&mut self, event: AppEvent) -> ControlFlow<()> {
        match self.dispatcher.handle(&mut self.ctx, event) {
            None => {}
            Some(Effect::GateChanged { enabled, persist }) => {
                if let Err(e) = self.tray.set_enabled(enabled) {
                    warn!("{:#}", e);
                }
                if persist
                    && let Err(e) = self
                        .settings
                        .update(|s| s.configuration.enabled = enabled)
                {
                    error!("Failed to save enable state: {}", e);
                }
            }
            Some(Effect::Tray(TrayAction::EditSnippets)) => self.edit_snippets(),
            Some(Effect::Tray(TrayAction::ReloadSnippets)) => self.reload_snippets(),
            Some(Effect::Tray(TrayAction::SetStartup(enabled))) => self.set_startup(enabled),
            Some(Effect::Tray(TrayAction::Quit)) => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }

    /// Open the settings file in Notepad, writing it first if needed.
    fn edit_snippets(&self) {
        if !self.settings.exists() {
            let current = Settings {
                configuration: self.ctx.configuration(),
                startup: self.startup,
            };
            if let Err(e) = self.settings.save(&current) {
                error!("Failed to create settings file: {}", e);
                return;
            }
        }

        if let Err(e) = Command::new("notepad.exe")
            .arg(self.settings.path())
            .spawn()
        {
            error!("Failed to open {}: {}", self.settings.path().display(), e);
        }
    }

    /// Re-read the settings file and queue it as a saved configuration.
    ///
    /// A broken file keeps the snippets already in memory.
    fn reload_snippets(&mut self) {
        match self.settings.try_load() {
            Ok(settings) => {
                self.queue
                    .push_back(AppEvent::ConfigurationSaved(settings.configuration));
            }
            Err(e) => warn!("Reload skipped: {}", e),
        }
    }

    /// Apply and persist the start with Windows toggle.
    fn set_startup(&mut self, enabled: bool) {
        if let Err(e) = startup::set_run_at_startup(enabled) {
            error!("{:#}", e);
            self.tray.set_startup(self.startup);
            return;
        }
        self.startup = enabled;
        if let Err(e) = self.settings.update(|s| s.startup = enabled) {
            error!("Failed to save startup setting: {}", e);
        }
    }

    /// Pump the Windows message queue so tray and hotkey events are delivered.
    fn pump_messages() {
        // SAFETY: MSG is a plain Windows struct; PeekMessageW, TranslateMessage,
        // and DispatchMessageW are standard message-loop calls with no invariants
        // beyond what the Windows API guarantees.
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
