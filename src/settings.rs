//! Persisted settings: enable gate, startup flag and the nine snippets.
//!
//! Stored as TOML under the user config dir:
//!
//! ```toml
//! [settings]
//! enable_auto_input = true
//! startup = false
//!
//! [hotkeys]
//! Alt1 = "Best regards,\nJane"
//! ```
//!
//! A missing or unreadable file is never fatal; callers get defaults.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::dispatch::Configuration;
use crate::snippets::Slot;

/// Directory name under the platform config dir.
const APP_DIR: &str = "AutoInput";

/// Settings file name.
const FILE_NAME: &str = "config.toml";

/// Errors reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Filesystem failure
    #[error("settings file {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The file is not valid settings TOML
    #[error("cannot parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be encoded
    #[error("cannot encode settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Everything stored in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Gate and snippets
    pub configuration: Configuration,
    /// Whether the app is registered to start with Windows
    pub startup: bool,
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    /// `[settings]` table
    #[serde(default)]
    settings: GeneralSection,
    /// `[hotkeys]` table keyed by `Alt1`..`Alt9`
    #[serde(default)]
    hotkeys: BTreeMap<String, String>,
}

/// The `[settings]` table.
#[derive(Debug, Serialize, Deserialize)]
struct GeneralSection {
    /// Enable gate
    #[serde(default = "default_enabled")]
    enable_auto_input: bool,
    /// Run at login
    #[serde(default)]
    startup: bool,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            enable_auto_input: default_enabled(),
            startup: false,
        }
    }
}

/// Triggers are live unless the user turned them off.
const fn default_enabled() -> bool {
    true
}

impl From<SettingsFile> for Settings {
    fn from(mut file: SettingsFile) -> Self {
        let snippets = Slot::ALL.map(|slot| {
            file.hotkeys
                .remove(&slot.key_name())
                .unwrap_or_default()
        });
        Self {
            configuration: Configuration {
                enabled: file.settings.enable_auto_input,
                snippets,
            },
            startup: file.settings.startup,
        }
    }
}

impl From<&Settings> for SettingsFile {
    fn from(settings: &Settings) -> Self {
        let hotkeys = Slot::ALL
            .into_iter()
            .map(|slot| {
                (
                    slot.key_name(),
                    settings.configuration.snippets[slot.index()].clone(),
                )
            })
            .collect();
        Self {
            settings: GeneralSection {
                enable_auto_input: settings.configuration.enabled,
                startup: settings.startup,
            },
            hotkeys,
        }
    }
}

/// Reads and writes one settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Location of the TOML file
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/AutoInput/config.toml`, falling back to the current
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(FILE_NAME)
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the settings file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Whether the settings file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the settings file, reporting every failure.
    pub fn try_load(&self) -> Result<Settings, SettingsError> {
        let text = fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: SettingsFile = toml::from_str(&text)?;
        Ok(file.into())
    }

    /// Read the settings file, falling back to defaults.
    pub fn load(&self) -> Settings {
        if !self.exists() {
            info!("No settings at {}, using defaults", self.path.display());
            return Settings::default();
        }
        match self.try_load() {
            Ok(settings) => {
                info!("Loaded settings from {}", self.path.display());
                settings
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Settings::default()
            }
        }
    }

    /// Write `settings`, creating the directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let text = toml::to_string_pretty(&SettingsFile::from(settings))?;
        fs::write(&self.path, text).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("Saved settings to {}", self.path.display());
        Ok(())
    }

    /// Load, change one part, and save again, leaving the rest of the file
    /// as it is on disk.
    ///
    /// A missing file starts from defaults. A file that cannot be read or
    /// parsed is left untouched and the error is returned.
    pub fn update(&self, change: impl FnOnce(&mut Settings)) -> Result<Settings, SettingsError> {
        let mut settings = match self.try_load() {
            Ok(settings) => settings,
            Err(SettingsError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Settings::default()
            }
            Err(e) => return Err(e),
        };
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("nested").join(FILE_NAME))
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.exists());
        let settings = store.load();
        assert_eq!(settings, Settings::default());
        assert!(settings.configuration.enabled);
        assert!(!settings.startup);
    }

    #[test]
    fn save_then_load_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut settings = Settings::default();
        settings.configuration.enabled = false;
        settings.startup = true;
        settings.configuration.snippets[0] = "Best regards,\nJane".to_owned();
        settings.configuration.snippets[4] = "地址：北京市".to_owned();
        settings.configuration.snippets[8] = "quote \" and = sign".to_owned();

        store.save(&settings).unwrap();

        assert_eq!(store.load(), settings);
    }

    #[test]
    fn reads_hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(
            &path,
            "[settings]\nenable_auto_input = false\n\n[hotkeys]\nAlt2 = \"two\"\nAlt9 = \"nine\"\nAlt10 = \"ignored\"\n",
        )
        .unwrap();

        let settings = SettingsStore::new(path).try_load().unwrap();

        assert!(!settings.configuration.enabled);
        assert!(!settings.startup);
        assert_eq!(settings.configuration.snippets[1], "two");
        assert_eq!(settings.configuration.snippets[8], "nine");
        assert!(settings.configuration.snippets[0].is_empty());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "[hotkeys]\nAlt1 = \"one\"\n").unwrap();

        let settings = SettingsStore::new(path).load();

        assert!(settings.configuration.enabled);
        assert_eq!(settings.configuration.snippets[0], "one");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "[settings\nenable_auto_input = ").unwrap();
        let store = SettingsStore::new(path);

        assert!(matches!(store.try_load(), Err(SettingsError::Parse(_))));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn update_only_touches_the_changed_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut settings = Settings::default();
        settings.configuration.snippets[2] = "edited on disk".to_owned();
        store.save(&settings).unwrap();

        let updated = store.update(|s| s.configuration.enabled = false).unwrap();

        assert!(!updated.configuration.enabled);
        assert_eq!(updated.configuration.snippets[2], "edited on disk");
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn update_creates_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let updated = store.update(|s| s.startup = true).unwrap();

        assert!(store.exists());
        assert!(updated.startup);
        assert!(updated.configuration.enabled);
        assert_eq!(store.load(), updated);
    }

    #[test]
    fn update_leaves_a_broken_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let broken = "[hotkeys]\nAlt1 = \"my signature\"\nAlt2 = \"unterminated\n";
        fs::write(&path, broken).unwrap();
        let store = SettingsStore::new(&path);

        let result = store.update(|s| s.configuration.enabled = false);

        assert!(matches!(result, Err(SettingsError::Parse(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn default_path_ends_with_app_file() {
        let path = SettingsStore::default_path();
        assert!(path.ends_with(Path::new(APP_DIR).join(FILE_NAME)));
    }
}
