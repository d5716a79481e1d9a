use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Environment variable that relocates the whole config directory.
pub const CONFIG_DIR_ENV: &str = "PAIRSHIP_CONFIG_DIR";

/// Base pairship config directory (~/.config/pairship/ on all platforms)
pub fn pairship() -> Result<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("pairship"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("pairship"))
    }
}

/// Pipeline settings file path
pub fn settings_json() -> Result<PathBuf> {
    Ok(pairship()?.join("settings.json"))
}

/// Projects directory
pub fn projects() -> Result<PathBuf> {
    Ok(pairship()?.join("projects"))
}
