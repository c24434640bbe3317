//! Path utilities for the engine's data directories.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global storage for a custom data directory path.
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Call early, before any other path functions; later calls are ignored.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".maestro"))
        .unwrap_or_else(|| PathBuf::from(".maestro"))
}

/// The base data directory (`~/.maestro` unless overridden).
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// The default workspace folder (`~/.maestro/workspace`).
pub fn workspace_dir() -> PathBuf {
    data_dir().join("workspace")
}
