//! Process options from the environment, optionally seeded from a .env file

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::settings::SettingsStore;

/// Log file name, placed next to the settings file.
const LOG_FILE_NAME: &str = "auto-input.log";

/// Runtime options. Snippets and the enable gate live in [`crate::settings`].
#[derive(Debug, Clone)]
pub struct Config {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub log_level: String,
    /// Write logs to a file instead of stderr
    pub log_to_file: bool,
    /// Location of the persisted settings file
    pub settings_path: PathBuf,
    /// Relaunch as administrator so input reaches elevated windows
    pub run_elevated: bool,
}

impl Config {
    /// Load configuration from the environment. A missing .env file is fine.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_owned());
        let log_to_file = match lookup("LOG_TO_FILE") {
            Some(value) => value.parse().context("Invalid LOG_TO_FILE")?,
            None => true,
        };
        let run_elevated = match lookup("RUN_ELEVATED") {
            Some(value) => value.parse().context("Invalid RUN_ELEVATED")?,
            None => true,
        };
        let settings_path = lookup("AUTO_INPUT_CONFIG")
            .filter(|value| !value.is_empty())
            .map_or_else(SettingsStore::default_path, PathBuf::from);

        Ok(Self {
            log_level,
            log_to_file,
            settings_path,
            run_elevated,
        })
    }

    /// Where the log file goes when `log_to_file` is set.
    pub fn log_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .map_or_else(|| PathBuf::from(LOG_FILE_NAME), |dir| dir.join(LOG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.log_to_file);
        assert!(config.run_elevated);
        assert_eq!(config.settings_path, SettingsStore::default_path());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("LOG_LEVEL", "debug"),
            ("LOG_TO_FILE", "false"),
            ("RUN_ELEVATED", "false"),
            ("AUTO_INPUT_CONFIG", "/tmp/auto-input/config.toml"),
        ])
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(!config.log_to_file);
        assert!(!config.run_elevated);
        assert_eq!(
            config.settings_path,
            PathBuf::from("/tmp/auto-input/config.toml")
        );
        assert_eq!(
            config.log_path(),
            PathBuf::from("/tmp/auto-input").join(LOG_FILE_NAME)
        );
    }

    #[test]
    fn empty_config_path_uses_default() {
        let config = config_from(&[("AUTO_INPUT_CONFIG", "")]).unwrap();
        assert_eq!(config.settings_path, SettingsStore::default_path());
    }

    #[test]
    fn invalid_elevation_flag_is_an_error() {
        let err = config_from(&[("RUN_ELEVATED", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("RUN_ELEVATED"));
    }

    #[test]
    fn invalid_bool_is_an_error() {
        let err = config_from(&[("LOG_TO_FILE", "yes")]).unwrap_err();
        assert!(err.to_string().contains("LOG_TO_FILE"));
    }
}
