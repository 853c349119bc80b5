// Linkshelf platform paths
// Resolves where the client keeps its settings file on each OS.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for Linkshelf.
///
/// - **Linux**: `$XDG_CONFIG_HOME/linkshelf` or `~/.config/linkshelf`
/// - **macOS**: `~/Library/Application Support/Linkshelf`
/// - **Windows**: `%APPDATA%/Linkshelf`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Default location of the settings file.
pub fn default_settings_path() -> PathBuf {
    get_config_dir().join("settings.json")
}
