//! Configuration file.
//!
//! Settings live in an INI file at `<config dir>/offmap/config.ini`. A
//! missing file, section or key falls back to the built-in default, so an
//! empty file is a valid configuration.
//!
//! ```ini
//! [tiles]
//! url_template = https://tile.openstreetmap.org/{z}/{x}/{y}.png
//! zoom = 15
//! concurrency = 4
//!
//! [storage]
//! capacity = 5MB
//! ```

mod keys;
mod size;

pub use keys::ConfigKey;
pub use size::{format_size, parse_size};

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::assistant::AssistantConfig;
use crate::compositor::{CanvasExtent, CompositorConfig};
use crate::download::{FetchConfig, DEFAULT_CONCURRENCY};
use crate::logging::LoggingConfig;
use crate::provider::DEFAULT_TILE_TEMPLATE;
use crate::store::{DEFAULT_CAPACITY_BYTES, DEFAULT_STORE_KEY};

/// Zoom level tiles are downloaded at.
pub const DEFAULT_DOWNLOAD_ZOOM: u8 = 15;

const APP_DIR: &str = "offmap";
const CONFIG_FILE_NAME: &str = "config.ini";
const TOKEN_FILE_NAME: &str = "identity_token";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid size '{value}': {reason}")]
    InvalidSize { value: String, reason: String },
}

/// `[tiles]`: tile server and download behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilesConfig {
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub zoom: u8,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub group_pause_ms: u64,
    pub max_retries: u32,
}

impl Default for TilesConfig {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            zoom: DEFAULT_DOWNLOAD_ZOOM,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: 30,
            group_pause_ms: 100,
            max_retries: 0,
        }
    }
}

impl TilesConfig {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new()
            .with_concurrency(self.concurrency)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_group_pause(Duration::from_millis(self.group_pause_ms))
            .with_max_retries(self.max_retries)
    }
}

/// `[storage]`: where and how much the map store may hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub key: String,
    pub capacity_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: data_dir(),
            key: DEFAULT_STORE_KEY.to_string(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
        }
    }
}

/// `[auth]`: sign-in requirement and token location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub required: bool,
    pub token_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            required: true,
            token_file: data_dir().join(TOKEN_FILE_NAME),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub tiles: TilesConfig,
    pub storage: StorageConfig,
    pub compositor: CompositorConfig,
    pub assistant: AssistantConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tiles: TilesConfig::default(),
            storage: StorageConfig::default(),
            // A world canvas at the download zoom is far beyond the pixel
            // limit, so rendering crops to the stored tiles.
            compositor: CompositorConfig::default().with_extent(CanvasExtent::Cropped),
            assistant: AssistantConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConfigFile {
    /// Loads from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Loads from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Saves to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Writes every setting to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(io_err)
    }
}

/// Location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

/// Default directory for stored maps and the identity token.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
