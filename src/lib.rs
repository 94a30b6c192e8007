//! `CityWeather` - nearest-city location resolution and durable user preferences
//!
//! This library provides the core logic behind a city weather lookup app:
//! a fixed city catalog, haversine-based nearest-city resolution, and a
//! preference store that keeps recent searches, favorites, settings, and a
//! weather cache durable across restarts.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod models;
pub mod preferences;
pub mod resolver;
pub mod storage;

// Re-export core types for public API
pub use app::WeatherApp;
pub use catalog::CityCatalog;
pub use config::CityWeatherConfig;
pub use error::CityWeatherError;
pub use geolocation::{FixedLocation, GeolocationProvider, NoLocation, PermissionStatus};
pub use models::{CityRecord, Coordinate, Settings, WeatherCondition};
pub use preferences::{MAX_RECENT_SEARCHES, PreferenceStore};
pub use resolver::LocationResolver;
pub use storage::{DurableStore, FjallStore, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CityWeatherError>;
