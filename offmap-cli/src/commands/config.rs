//! Configuration management CLI commands.
//!
//! `config get`, `config set`, `config list` and `config path` read and edit
//! the INI file without touching stored maps.

use std::path::Path;

use clap::Subcommand;
use offmap::config::{ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., tiles.zoom)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., tiles.zoom)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(path, &key),
        ConfigCommands::Set { key, value } => run_set(path, &key, &value),
        ConfigCommands::List => run_list(path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse()
        .map_err(|_| CliError::Config(format!("Unknown configuration key '{}'", key)))
}

fn run_get(path: &Path, key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load_from(path).unwrap_or_default();
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

/// Values are validated before the file is rewritten.
fn run_set(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    let mut config = ConfigFile::load_from(path).unwrap_or_default();
    config_key.set(&mut config, value)?;
    config.save_to(path)?;

    println!("Set {} = {}", config_key.name(), config_key.get(&config));
    Ok(())
}

fn run_list(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path).unwrap_or_default();

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        run_set(&path, "tiles.zoom", "14").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.tiles.zoom, 14);
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        assert!(run_set(&path, "tiles.zoom", "ninety").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        match run_get(&path, "tiles.colour") {
            Err(CliError::Config(msg)) => assert!(msg.contains("tiles.colour")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
