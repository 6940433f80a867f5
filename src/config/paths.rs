//! Platform-specific data directory paths.
//!
//!   Windows: %APPDATA%/voice-speak
//!   macOS:   ~/Library/Application Support/voice-speak
//!   Linux:   $XDG_CONFIG_HOME/voice-speak (default ~/.config)
//!
//! `VOICE_SPEAK_DATA_DIR` overrides all of the above.

use std::path::PathBuf;

const APP_DIR: &str = "voice-speak";

/// Get the voice-speak data directory (cross-platform).
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("VOICE_SPEAK_DATA_DIR") {
        return PathBuf::from(dir);
    }
    get_config_base().join(APP_DIR)
}

/// Directory holding rolling log files.
pub fn get_log_dir() -> PathBuf {
    get_data_dir().join("logs")
}

/// Get the platform-appropriate base config directory.
fn get_config_base() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata);
        }
        dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("AppData")
                .join("Roaming")
        })
    }

    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library")
            .join("Application Support")
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
    }
}
