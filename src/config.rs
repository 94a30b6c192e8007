//! Configuration management for the `CityWeather` application
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::error::CityWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `CityWeather` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityWeatherConfig {
    /// Durable store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Durable store configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Durable store directory location
    #[serde(default = "default_storage_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// City shown when no location and no search history is available
    #[serde(default = "default_fallback_city")]
    pub fallback_city: String,
}

// Default value functions
fn default_storage_location() -> String {
    "~/.local/share/cityweather".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_fallback_city() -> String {
    "London".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            location: default_storage_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            fallback_city: default_fallback_city(),
        }
    }
}

impl Default for CityWeatherConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl CityWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with CITYWEATHER_ prefix
        builder = builder.add_source(
            Environment::with_prefix("CITYWEATHER")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CityWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cityweather").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.storage.location.is_empty() {
            self.storage.location = default_storage_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.fallback_city.is_empty() {
            self.defaults.fallback_city = default_fallback_city();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if self.defaults.fallback_city.trim().is_empty() {
            return Err(CityWeatherError::config("Fallback city cannot be blank").into());
        }

        Ok(())
    }

    /// Resolve the storage location, expanding a leading `~`
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        if let Some(rest) = self.storage.location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.storage.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CityWeatherConfig::default();
        assert_eq!(config.storage.location, "~/.local/share/cityweather");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.defaults.fallback_city, "London");
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CityWeatherConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = CityWeatherConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_blank_fallback_city() {
        let mut config = CityWeatherConfig::default();
        config.defaults.fallback_city = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_empty_fields() {
        let mut config = CityWeatherConfig::default();
        config.logging.level = String::new();
        config.defaults.fallback_city = String::new();

        config.apply_defaults();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.fallback_city, "London");
    }

    #[test]
    fn test_config_path_generation() {
        let path = CityWeatherConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("cityweather"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_storage_path_expands_tilde() {
        let config = CityWeatherConfig::default();
        let path = config.storage_path();
        assert!(!path.to_string_lossy().starts_with("~"));
    }
}
