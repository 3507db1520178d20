// Author: Dustin Pilgrim
// License: MIT

use std::path::{Path, PathBuf};

fn state_dir() -> PathBuf {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("regionpick")
}

pub fn default_log_path(file: &str) -> PathBuf {
    state_dir().join(file)
}

/// $XDG_STATE_HOME/regionpick/last_selection.bin
pub fn default_state_path() -> PathBuf {
    state_dir().join("last_selection.bin")
}

pub fn default_config_path() -> PathBuf {
    let dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    dir.join("regionpick").join("regionpick.rune")
}

pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
