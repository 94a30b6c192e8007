//! Geolocation collaborator interface
//!
//! The device permission prompt and position fix live outside this core;
//! only the interface they must satisfy is defined here, together with two
//! trivial implementations used by the demo binary and tests.

use crate::error::CityWeatherError;
use crate::models::Coordinate;
use async_trait::async_trait;

/// Outcome of the device location permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Source of the device's current position
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Ask the user for location permission
    async fn request_permission(&self) -> Result<PermissionStatus, CityWeatherError>;

    /// Current device coordinate; only called after permission was granted
    async fn current_coordinate(&self) -> Result<Coordinate, CityWeatherError>;
}

/// Provider that always grants permission and reports a fixed coordinate
pub struct FixedLocation {
    coordinate: Coordinate,
}

impl FixedLocation {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn request_permission(&self) -> Result<PermissionStatus, CityWeatherError> {
        Ok(PermissionStatus::Granted)
    }

    async fn current_coordinate(&self) -> Result<Coordinate, CityWeatherError> {
        Ok(self.coordinate)
    }
}

/// Provider for environments without location access; always denies
pub struct NoLocation;

#[async_trait]
impl GeolocationProvider for NoLocation {
    async fn request_permission(&self) -> Result<PermissionStatus, CityWeatherError> {
        Ok(PermissionStatus::Denied)
    }

    async fn current_coordinate(&self) -> Result<Coordinate, CityWeatherError> {
        Err(CityWeatherError::location("location access denied"))
    }
}
