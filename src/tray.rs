//! System tray icon and menu

use anyhow::{Context, Result};
use tracing::info;
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{CheckMenuItem, Menu, MenuEvent, MenuItem, PredefinedMenuItem},
};

use crate::dispatch::{AppEvent, TrayAction};

/// Optional icon shipped next to the executable.
const ICON_PATH: &str = "./assets/icons/auto-input.ico";

/// Edge length of the generated fallback icon.
const FALLBACK_ICON_SIZE: u32 = 32;

/// System tray manager
pub struct TrayManager {
    /// Tray icon
    tray: TrayIcon,
    /// Opens the settings file
    edit_item: MenuItem,
    /// Re-reads the settings file
    reload_item: MenuItem,
    /// Enable gate toggle
    enabled_item: CheckMenuItem,
    /// Run-at-login toggle
    startup_item: CheckMenuItem,
    /// Quit menu item
    quit_item: MenuItem,
}

impl TrayManager {
    /// Create the tray icon with its menu reflecting the given state.
    pub fn new(enabled: bool, startup: bool) -> Result<Self> {
        let edit_item = MenuItem::new("Edit snippets…", true, None);
        let reload_item = MenuItem::new("Reload snippets", true, None);
        let enabled_item = CheckMenuItem::new("Enabled", true, enabled, None);
        let startup_item = CheckMenuItem::new("Start with Windows", true, startup, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let menu = Menu::new();
        menu.append_items(&[
            &edit_item,
            &reload_item,
            &PredefinedMenuItem::separator(),
            &enabled_item,
            &startup_item,
            &PredefinedMenuItem::separator(),
            &quit_item,
        ])
        .context("Failed to build tray menu")?;

        let mut builder = TrayIconBuilder::new()
            .with_tooltip(Self::tooltip(enabled))
            .with_menu(Box::new(menu));

        if let Some(icon) = Self::load_icon() {
            builder = builder.with_icon(icon);
        }

        let tray = builder.build().context("Failed to create tray icon")?;

        info!("System tray icon created");

        Ok(Self {
            tray,
            edit_item,
            reload_item,
            enabled_item,
            startup_item,
            quit_item,
        })
    }

    /// Tooltip text for the given gate state.
    fn tooltip(enabled: bool) -> &'static str {
        if enabled {
            "Auto Input - Alt+1..9 active"
        } else {
            "Auto Input - disabled"
        }
    }

    /// Load the icon file, or draw a plain one if it is missing.
    fn load_icon() -> Option<Icon> {
        match Icon::from_path(ICON_PATH, None) {
            Ok(icon) => {
                info!("Loaded icon: {}", ICON_PATH);
                Some(icon)
            }
            Err(e) => {
                info!("Could not load icon {}: {} (drawing default)", ICON_PATH, e);
                Self::fallback_icon()
            }
        }
    }

    /// A solid square with transparent corners.
    fn fallback_icon() -> Option<Icon> {
        let size = FALLBACK_ICON_SIZE;
        let mut rgba = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let corner = (x < 2 || x >= size - 2) && (y < 2 || y >= size - 2);
                let alpha = if corner { 0 } else { 255 };
                rgba.extend_from_slice(&[0x2b, 0x6c, 0xb0, alpha]);
            }
        }
        Icon::from_rgba(rgba, size, size).ok()
    }

    /// Reflect a new gate state in the tooltip and check item.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.enabled_item.set_checked(enabled);
        self.tray
            .set_tooltip(Some(Self::tooltip(enabled)))
            .context("Failed to set tooltip")?;
        info!("Tray state updated: enabled={}", enabled);
        Ok(())
    }

    /// Reflect the run-at-login state in the check item.
    pub fn set_startup(&self, startup: bool) {
        self.startup_item.set_checked(startup);
    }

    /// Next pending menu activation, as an app event.
    pub fn poll_event(&self) -> Option<AppEvent> {
        let event = MenuEvent::receiver().try_recv().ok()?;
        if event.id == self.enabled_item.id() {
            Some(AppEvent::EnableToggled(self.enabled_item.is_checked()))
        } else if event.id == self.startup_item.id() {
            Some(AppEvent::TrayActivated(TrayAction::SetStartup(
                self.startup_item.is_checked(),
            )))
        } else if event.id == self.edit_item.id() {
            Some(AppEvent::TrayActivated(TrayAction::EditSnippets))
        } else if event.id == self.reload_item.id() {
            Some(AppEvent::TrayActivated(TrayAction::ReloadSnippets))
        } else if event.id == self.quit_item.id() {
            Some(AppEvent::TrayActivated(TrayAction::Quit))
        } else {
            None
        }
    }
}
