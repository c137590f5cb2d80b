//! File-backed logging setup.
//!
//! The terminal belongs to the TUI, so events go to a log file instead of
//! stderr. Failures here are non-fatal; the player runs fine unlogged.

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

/// Install the global `tracing` subscriber writing to the configured file.
pub fn init(settings: &LogSettings) {
    let Some(path) = resolve_log_path(settings) else {
        return;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let Ok(file) = File::create(&path) else {
        return;
    };

    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Configured file, or `$XDG_STATE_HOME/vivace/vivace.log` (fallback
/// `~/.local/state/vivace/vivace.log`).
fn resolve_log_path(settings: &LogSettings) -> Option<PathBuf> {
    if let Some(file) = &settings.file {
        return Some(PathBuf::from(file));
    }

    let state_home = if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state")
    } else {
        return None;
    };

    Some(state_home.join("vivace").join("vivace.log"))
}
