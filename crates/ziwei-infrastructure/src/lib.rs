//! File-system and process adapters: configuration, secrets and the
//! ephemeris collaborators.

pub mod command_ephemeris;
pub mod config_storage;
pub mod dto;
pub mod file_ephemeris;
pub mod paths;
pub mod secret_storage;

use ziwei_core::chart::Ephemeris;
use ziwei_core::config::EphemerisSettings;

pub use command_ephemeris::CommandEphemeris;
pub use config_storage::ConfigStorage;
pub use file_ephemeris::FileEphemeris;
pub use paths::ZiweiPaths;
pub use secret_storage::{Credentials, SecretStorage, resolve_credentials};

/// Picks the replay adapter when a chart file is configured, otherwise the
/// external command.
pub fn ephemeris_from_settings(settings: &EphemerisSettings) -> Box<dyn Ephemeris> {
    match &settings.chart_file {
        Some(path) => Box::new(FileEphemeris::new(path.clone())),
        None => Box::new(CommandEphemeris::from_settings(settings)),
    }
}
