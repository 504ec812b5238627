//! Addressable configuration keys (`section.key`).

use std::path::PathBuf;
use std::str::FromStr;

use super::{format_size, parse_size, ConfigError, ConfigFile};
use crate::compositor::CanvasExtent;
use crate::coord::MAX_ZOOM;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Every setting the configuration file understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    TilesUrlTemplate,
    TilesSubdomains,
    TilesZoom,
    TilesConcurrency,
    TilesTimeout,
    TilesGroupPauseMs,
    TilesMaxRetries,
    StorageDirectory,
    StorageKey,
    StorageCapacity,
    CompositorTileSize,
    CompositorExtent,
    CompositorMaxCanvasPx,
    AssistantEndpoint,
    AssistantModel,
    AssistantTemperature,
    AssistantMaxTokens,
    AssistantContextLimit,
    AuthRequired,
    AuthTokenFile,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            TilesUrlTemplate,
            TilesSubdomains,
            TilesZoom,
            TilesConcurrency,
            TilesTimeout,
            TilesGroupPauseMs,
            TilesMaxRetries,
            StorageDirectory,
            StorageKey,
            StorageCapacity,
            CompositorTileSize,
            CompositorExtent,
            CompositorMaxCanvasPx,
            AssistantEndpoint,
            AssistantModel,
            AssistantTemperature,
            AssistantMaxTokens,
            AssistantContextLimit,
            AuthRequired,
            AuthTokenFile,
            LoggingLevel,
            LoggingDirectory,
        ]
    }

    /// Full name, e.g. `tiles.zoom`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            TilesUrlTemplate | TilesSubdomains | TilesZoom | TilesConcurrency | TilesTimeout
            | TilesGroupPauseMs | TilesMaxRetries => "tiles",
            StorageDirectory | StorageKey | StorageCapacity => "storage",
            CompositorTileSize | CompositorExtent | CompositorMaxCanvasPx => "compositor",
            AssistantEndpoint | AssistantModel | AssistantTemperature | AssistantMaxTokens
            | AssistantContextLimit => "assistant",
            AuthRequired | AuthTokenFile => "auth",
            LoggingLevel | LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            TilesUrlTemplate => "url_template",
            TilesSubdomains => "subdomains",
            TilesZoom => "zoom",
            TilesConcurrency => "concurrency",
            TilesTimeout => "timeout",
            TilesGroupPauseMs => "group_pause_ms",
            TilesMaxRetries => "max_retries",
            StorageDirectory => "directory",
            StorageKey => "key",
            StorageCapacity => "capacity",
            CompositorTileSize => "tile_size",
            CompositorExtent => "extent",
            CompositorMaxCanvasPx => "max_canvas_px",
            AssistantEndpoint => "endpoint",
            AssistantModel => "model",
            AssistantTemperature => "temperature",
            AssistantMaxTokens => "max_tokens",
            AssistantContextLimit => "context_limit",
            AuthRequired => "required",
            AuthTokenFile => "token_file",
            LoggingLevel => "level",
            LoggingDirectory => "directory",
        }
    }

    /// Current value as written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        match self {
            TilesUrlTemplate => config.tiles.url_template.clone(),
            TilesSubdomains => config.tiles.subdomains.join(","),
            TilesZoom => config.tiles.zoom.to_string(),
            TilesConcurrency => config.tiles.concurrency.to_string(),
            TilesTimeout => config.tiles.timeout_secs.to_string(),
            TilesGroupPauseMs => config.tiles.group_pause_ms.to_string(),
            TilesMaxRetries => config.tiles.max_retries.to_string(),
            StorageDirectory => config.storage.directory.display().to_string(),
            StorageKey => config.storage.key.clone(),
            StorageCapacity => format_size(config.storage.capacity_bytes),
            CompositorTileSize => config.compositor.tile_size.to_string(),
            CompositorExtent => config.compositor.extent.to_string(),
            CompositorMaxCanvasPx => config.compositor.max_canvas_px.to_string(),
            AssistantEndpoint => config.assistant.endpoint.clone(),
            AssistantModel => config.assistant.model.clone(),
            AssistantTemperature => config.assistant.temperature.to_string(),
            AssistantMaxTokens => config.assistant.max_tokens.to_string(),
            AssistantContextLimit => config.assistant.context_limit.to_string(),
            AuthRequired => config.auth.required.to_string(),
            AuthTokenFile => config.auth.token_file.display().to_string(),
            LoggingLevel => config.logging.level.clone(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parses and applies `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            TilesUrlTemplate => {
                if !["{z}", "{x}", "{y}"].iter().all(|p| value.contains(p)) {
                    return Err(invalid("template must contain {z}, {x} and {y}"));
                }
                config.tiles.url_template = value.to_string();
            }
            TilesSubdomains => {
                config.tiles.subdomains = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
            }
            TilesZoom => {
                let zoom: u8 = value.parse().map_err(|_| invalid("not a zoom level"))?;
                if zoom > MAX_ZOOM {
                    return Err(invalid("zoom is above the maximum of 22"));
                }
                config.tiles.zoom = zoom;
            }
            TilesConcurrency => {
                config.tiles.concurrency = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1"))?;
            }
            TilesTimeout => {
                config.tiles.timeout_secs = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1 second"))?;
            }
            TilesGroupPauseMs => {
                config.tiles.group_pause_ms = value.parse().map_err(|_| invalid("not a number"))?;
            }
            TilesMaxRetries => {
                config.tiles.max_retries = value.parse().map_err(|_| invalid("not a number"))?;
            }
            StorageDirectory => {
                if value.is_empty() {
                    return Err(invalid("directory cannot be empty"));
                }
                config.storage.directory = PathBuf::from(value);
            }
            StorageKey => {
                if value.is_empty() {
                    return Err(invalid("key cannot be empty"));
                }
                config.storage.key = value.to_string();
            }
            StorageCapacity => {
                config.storage.capacity_bytes = parse_size(value)?;
            }
            CompositorTileSize => {
                config.compositor.tile_size = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1 pixel"))?;
            }
            CompositorExtent => {
                config.compositor.extent =
                    CanvasExtent::from_str(value).map_err(|e| invalid(&e.to_string()))?;
            }
            CompositorMaxCanvasPx => {
                config.compositor.max_canvas_px = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1 pixel"))?;
            }
            AssistantEndpoint => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("endpoint must be an http(s) URL"));
                }
                config.assistant.endpoint = value.to_string();
            }
            AssistantModel => {
                if value.is_empty() {
                    return Err(invalid("model cannot be empty"));
                }
                config.assistant.model = value.to_string();
            }
            AssistantTemperature => {
                let temperature: f32 = value.parse().map_err(|_| invalid("not a number"))?;
                if !temperature.is_finite() || temperature < 0.0 {
                    return Err(invalid("must be zero or more"));
                }
                config.assistant.temperature = temperature;
            }
            AssistantMaxTokens => {
                config.assistant.max_tokens = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1"))?;
            }
            AssistantContextLimit => {
                config.assistant.context_limit = parse_positive(value)
                    .ok_or_else(|| invalid("must be at least 1"))?;
            }
            AuthRequired => {
                config.auth.required = parse_bool(value)
                    .ok_or_else(|| invalid("expected true or false"))?;
            }
            AuthTokenFile => {
                if value.is_empty() {
                    return Err(invalid("path cannot be empty"));
                }
                config.auth.token_file = PathBuf::from(value);
            }
            LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("expected error, warn, info, debug or trace"));
                }
                config.logging.level = level;
            }
            LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn parse_positive<T>(value: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    value.parse::<T>().ok().filter(|v| *v > T::default())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse_back() {
        for key in ConfigKey::all() {
            let parsed: ConfigKey = key.name().parse().unwrap();
            assert_eq!(parsed, *key);
        }
        let mut names: Vec<_> = ConfigKey::all().iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ConfigKey::all().len());
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            "tiles.colour".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_set_then_get() {
        let mut config = ConfigFile::default();

        ConfigKey::TilesConcurrency.set(&mut config, "8").unwrap();
        ConfigKey::StorageCapacity.set(&mut config, "10mb").unwrap();
        ConfigKey::CompositorExtent.set(&mut config, "world").unwrap();
        ConfigKey::AuthRequired.set(&mut config, "no").unwrap();

        assert_eq!(ConfigKey::TilesConcurrency.get(&config), "8");
        assert_eq!(ConfigKey::StorageCapacity.get(&config), "10MB");
        assert_eq!(ConfigKey::CompositorExtent.get(&config), "world");
        assert_eq!(ConfigKey::AuthRequired.get(&config), "false");
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::TilesConcurrency.set(&mut config, "0").is_err());
        assert!(ConfigKey::TilesUrlTemplate.set(&mut config, "https://x/{z}.png").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "loud").is_err());
        assert!(ConfigKey::AssistantEndpoint.set(&mut config, "localhost").is_err());
        assert!(ConfigKey::CompositorExtent.set(&mut config, "tiled").is_err());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_empty_log_directory_disables_file_logging() {
        let mut config = ConfigFile::default();
        ConfigKey::LoggingDirectory.set(&mut config, "/var/log/offmap").unwrap();
        assert!(config.logging.directory.is_some());

        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert!(config.logging.directory.is_none());
    }
}
