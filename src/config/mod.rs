//! Configuration for the civicsync pipeline
//!
//! Configuration is resolved once at startup (TOML file or environment
//! variables, with defaults for everything except the geocoding key) and
//! passed into constructors explicitly; nothing reads ambient state after
//! that point.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub geocoding: GeocodingConfig,
    pub feeds: FeedsConfig,
    pub logging: LoggingConfig,
}

/// SQLite storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("livelihood.db"),
        }
    }
}

/// Geocoding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// API key for the geocoding service
    pub api_key: String,

    /// Response language for formatted addresses
    pub language: String,

    /// Service base URL (overridable for mock-server tests)
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: "zh-tw".to_string(),
            base_url: "https://maps.googleapis.com".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Upstream feed endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Water outage resource on the municipal open-data portal
    pub water_url: String,

    /// Road construction resource on the municipal open-data portal
    pub road_url: String,

    /// Which power feed variant to read
    pub power_mode: PowerFeedMode,

    /// Extracted archive text endpoint (the zip download and extraction are
    /// handled by an external collaborator; this URL serves its output)
    pub power_archive_url: String,

    /// HTML bulletin page of the utility
    pub power_bulletin_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            water_url: "http://data.taipei/opendata/datalist/apiAccess?scope=resourceAquire&rid=a242ee9b-b954-4ae9-9827-2344c5dfeaea".to_string(),
            road_url: "http://data.taipei/opendata/datalist/apiAccess?scope=resourceAquire&rid=201d8ae8-dffc-4d17-ae1f-e58d8a95b162".to_string(),
            power_mode: PowerFeedMode::Bulletin,
            power_archive_url: "http://data.taipower.com.tw/opendata/apply/file/d077004/102.txt".to_string(),
            power_bulletin_url: "http://branch.taipower.com.tw/Content/NoticeBlackout/bulletin.aspx?SiteID=564732646551216421&MmmID=616371300113254267".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Power feed variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerFeedMode {
    /// `#`-delimited text extracted from the open-data archive
    Archive,
    /// HTML bulletin table on the utility site
    Bulletin,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("CIVICSYNC_DB_PATH") {
            config.database.path = PathBuf::from(path);
        }
        if let Ok(key) = std::env::var("CIVICSYNC_GEO_API_KEY") {
            config.geocoding.api_key = key;
        }
        if let Ok(url) = std::env::var("CIVICSYNC_GEO_BASE_URL") {
            config.geocoding.base_url = url;
        }
        if let Ok(url) = std::env::var("CIVICSYNC_WATER_URL") {
            config.feeds.water_url = url;
        }
        if let Ok(url) = std::env::var("CIVICSYNC_ROAD_URL") {
            config.feeds.road_url = url;
        }
        if let Ok(mode) = std::env::var("CIVICSYNC_POWER_MODE") {
            match mode.to_lowercase().as_str() {
                "archive" => config.feeds.power_mode = PowerFeedMode::Archive,
                "bulletin" => config.feeds.power_mode = PowerFeedMode::Bulletin,
                other => tracing::warn!(mode = %other, "unknown power feed mode, keeping default"),
            }
        }
        if let Ok(url) = std::env::var("CIVICSYNC_POWER_ARCHIVE_URL") {
            config.feeds.power_archive_url = url;
        }
        if let Ok(url) = std::env::var("CIVICSYNC_POWER_BULLETIN_URL") {
            config.feeds.power_bulletin_url = url;
        }
        if let Ok(level) = std::env::var("CIVICSYNC_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("CIVICSYNC_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    /// Load from an explicit file when given, otherwise from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::from_env()),
        }
    }

    /// Validate settings that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.geocoding.api_key.is_empty() {
            anyhow::bail!(
                "geocoding.api_key is not set (config file or CIVICSYNC_GEO_API_KEY)"
            );
        }
        if self.feeds.water_url.is_empty()
            || self.feeds.road_url.is_empty()
        {
            anyhow::bail!("feed URLs must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.path, PathBuf::from("livelihood.db"));
        assert_eq!(config.geocoding.language, "zh-tw");
        assert_eq!(config.feeds.power_mode, PowerFeedMode::Bulletin);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.geocoding.api_key = "test-key".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml_str = r#"
            [database]
            path = "events.db"

            [geocoding]
            api_key = "abc123"

            [feeds]
            power_mode = "archive"

            [logging]
            format = "json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.path, PathBuf::from("events.db"));
        assert_eq!(config.geocoding.api_key, "abc123");
        assert_eq!(config.feeds.power_mode, PowerFeedMode::Archive);
        assert_eq!(config.logging.format, "json");
        // Unspecified sections keep their defaults
        assert_eq!(config.feeds.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
    }
}
