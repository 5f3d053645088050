//! Auto Input: Alt+1..Alt+9 insert user-configured text snippets into the
//! focused application on Windows.

#![cfg_attr(windows, windows_subsystem = "windows")]
#![cfg_attr(
    not(windows),
    allow(dead_code, reason = "the tray shell that drives the core is Windows-only")
)]

#[cfg(windows)]
mod app;
mod config;
mod dispatch;
#[cfg(windows)]
mod elevation;
mod inject;
#[cfg(windows)]
mod instance;
mod settings;
mod snippets;
#[cfg(windows)]
mod startup;
#[cfg(windows)]
mod tray;
mod trigger;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Main entry point: load configuration, set up logging, and run the app.
fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    setup_logging(&config)?;
    run(&config)
}

/// Elevate if asked to, enforce a single instance, then hand control to the
/// event loop.
#[cfg(windows)]
fn run(config: &Config) -> Result<()> {
    if config.run_elevated
        && elevation::relaunch_as_admin_if_needed() == elevation::Elevation::Relaunched
    {
        return Ok(());
    }

    let _instance = match instance::SingleInstance::acquire() {
        Ok(Some(guard)) => Some(guard),
        Ok(None) => {
            tracing::info!("Another instance is already running");
            return Ok(());
        }
        Err(e) => {
            tracing::warn!("{:#}; continuing without single-instance guard", e);
            None
        }
    };
    app::App::new(config)?.run()
}

/// The hotkey, clipboard and input backends only exist on Windows.
#[cfg(not(windows))]
fn run(_config: &Config) -> Result<()> {
    anyhow::bail!("Auto Input only runs on Windows")
}

/// Configure tracing based on the log level and output destination in config.
fn setup_logging(config: &Config) -> Result<()> {
    let level = match config.log_level.as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::new(level);
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if config.log_to_file {
        let path = config.log_path();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;
        subscriber.with_ansi(false).with_writer(file).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
