//! Loading of `config.toml`.

use std::path::{Path, PathBuf};

use ziwei_core::Result;
use ziwei_core::config::AppConfig;

use crate::paths::ZiweiPaths;

/// Read-only access to the application config file.
///
/// A missing file yields [`AppConfig::default`]; a malformed one is an error.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Storage at the default location (`~/.config/ziwei/config.toml`).
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: ZiweiPaths::config_file()?,
        })
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: AppConfig = toml::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), "Loaded config");
        Ok(config)
    }
}
