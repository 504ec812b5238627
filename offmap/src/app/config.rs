//! Application configuration for [`OfflineMaps`](super::OfflineMaps).
//!
//! `AppConfig` gathers what the assembled application needs from the
//! configuration file so the translation lives in one place instead of in
//! CLI code.

use std::path::PathBuf;

use crate::compositor::CompositorConfig;
use crate::config::ConfigFile;
use crate::download::FetchConfig;
use crate::provider::DEFAULT_TILE_TEMPLATE;
use crate::store::{DEFAULT_CAPACITY_BYTES, DEFAULT_STORE_KEY};

/// Everything needed to assemble [`OfflineMaps`](super::OfflineMaps).
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Zoom level tiles are downloaded at.
    pub zoom: u8,
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub fetch: FetchConfig,
    /// HTTP client timeout in seconds.
    pub http_timeout_secs: u64,
    pub storage_dir: PathBuf,
    pub store_key: String,
    pub capacity_bytes: u64,
    pub compositor: CompositorConfig,
    /// When false, downloads do not require a signed-in user.
    pub auth_required: bool,
    pub token_file: PathBuf,
}

impl AppConfig {
    /// Config with default settings rooted at `storage_dir`.
    pub fn new(storage_dir: PathBuf) -> Self {
        Self {
            zoom: crate::config::DEFAULT_DOWNLOAD_ZOOM,
            url_template: DEFAULT_TILE_TEMPLATE.to_string(),
            subdomains: Vec::new(),
            fetch: FetchConfig::default(),
            http_timeout_secs: crate::provider::DEFAULT_TIMEOUT_SECS,
            token_file: storage_dir.join("identity_token"),
            storage_dir,
            store_key: DEFAULT_STORE_KEY.to_string(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            compositor: CompositorConfig::default(),
            auth_required: true,
        }
    }

    /// Builds the application config from a loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            zoom: config.tiles.zoom,
            url_template: config.tiles.url_template.clone(),
            subdomains: config.tiles.subdomains.clone(),
            fetch: config.tiles.fetch_config(),
            http_timeout_secs: config.tiles.timeout_secs,
            storage_dir: config.storage.directory.clone(),
            store_key: config.storage.key.clone(),
            capacity_bytes: config.storage.capacity_bytes,
            compositor: config.compositor.clone(),
            auth_required: config.auth.required,
            token_file: config.auth.token_file.clone(),
        }
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_capacity(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }
}
