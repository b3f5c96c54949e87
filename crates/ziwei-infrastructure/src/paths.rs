//! Path resolution for ziwei configuration files.
//!
//! ```text
//! ~/.config/ziwei/
//! ├── config.toml     # ephemeris + LLM settings
//! └── secret.json     # API keys
//! ```
//!
//! `ZIWEI_CONFIG_DIR` replaces the whole directory.

use std::path::PathBuf;

use ziwei_core::{Result, ZiweiError};

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "ZIWEI_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const SECRET_FILE: &str = "secret.json";

pub struct ZiweiPaths;

impl ZiweiPaths {
    /// Returns the configuration directory (e.g. `~/.config/ziwei/`).
    pub fn config_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| ZiweiError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("ziwei"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn secret_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(SECRET_FILE))
    }
}
