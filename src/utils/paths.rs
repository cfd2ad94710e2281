//! Cross-Platform Path Utilities
//!
//! Resolves the client's data directory (~/.suluk/ unless overridden) and the
//! files kept in it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Suluk directory (~/.suluk/)
pub fn suluk_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".suluk"))
}

/// config.json inside `dir`
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

/// credentials.json inside `dir`
pub fn credentials_path(dir: &Path) -> PathBuf {
    dir.join("credentials.json")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
