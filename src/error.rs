//! Error types and handling for the `CityWeather` core

use thiserror::Error;

/// Main error type for the `CityWeather` core
#[derive(Error, Debug)]
pub enum CityWeatherError {
    /// Catalog loading errors (fatal at startup)
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Invalid coordinate input
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Durable store read/write errors
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Geolocation collaborator errors
    #[error("Location error: {message}")]
    Location { message: String },

    /// Serialization errors for persisted values
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CityWeatherError {
    /// Create a new catalog error
    pub fn catalog<S: Into<String>>(message: S) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a new invalid-coordinate error
    pub fn invalid_coordinate<S: Into<String>>(message: S) -> Self {
        Self::InvalidCoordinate {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a new location error
    pub fn location<S: Into<String>>(message: S) -> Self {
        Self::Location {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CityWeatherError::Catalog { .. } => {
                "The city catalog could not be loaded. The app cannot start.".to_string()
            }
            CityWeatherError::InvalidCoordinate { message } => {
                format!("Invalid coordinate: {message}")
            }
            CityWeatherError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            CityWeatherError::Persistence { .. } => {
                "Saved preferences could not be read or written. Your current session is unaffected."
                    .to_string()
            }
            CityWeatherError::Location { .. } => {
                "Your location could not be determined.".to_string()
            }
            CityWeatherError::Serialization { .. } => {
                "Stored data was malformed and has been reset.".to_string()
            }
            CityWeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
