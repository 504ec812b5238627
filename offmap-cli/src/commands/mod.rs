//! CLI command implementations.

pub mod areas;
pub mod ask;
pub mod auth;
pub mod config;
pub mod download;
pub mod maps;
pub mod render;

use offmap::app::{AppConfig, ConfiguredMaps};
use offmap::config::ConfigFile;

use crate::error::CliError;

/// Assembles the application from the loaded configuration.
pub(crate) fn open_maps(config: &ConfigFile) -> Result<ConfiguredMaps, CliError> {
    Ok(ConfiguredMaps::from_config(&AppConfig::from_config_file(config))?)
}
