//! Core data model: city records, coordinates, and user settings

use crate::error::CityWeatherError;
use serde::{Deserialize, Serialize};

/// Weather condition reported for a city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Thunderstorm,
    Foggy,
    Windy,
}

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees, [-90, 90]
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees, [-180, 180]
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CityWeatherError> {
        let coord = Self {
            latitude,
            longitude,
        };
        coord.validate()?;
        Ok(coord)
    }

    /// Check that both components are finite and in range
    pub fn validate(&self) -> Result<(), CityWeatherError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CityWeatherError::invalid_coordinate(format!(
                "latitude {} out of range [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CityWeatherError::invalid_coordinate(format!(
                "longitude {} out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }

    /// Format coordinate as a display string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One known city's static weather snapshot and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRecord {
    /// City name, the stable identity key (unique within the catalog)
    pub name: String,
    /// Country the city belongs to
    pub country: String,
    /// Temperature in degrees Celsius (canonical unit)
    pub temperature: f64,
    /// Current weather condition
    pub condition: WeatherCondition,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Coordinates, absent for cities without location data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinate>,
}

impl CityRecord {
    /// Case-normalized form of the city name, used as cache key
    #[must_use]
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }
}

/// User settings, persisted together as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Display temperatures in Celsius (Fahrenheit when false)
    pub use_celsius: bool,
    /// Dark UI theme enabled
    pub use_dark_theme: bool,
}

impl Settings {
    /// Default settings for a given local hour of day.
    ///
    /// The theme defaults to dark outside daylight hours (before 06:00
    /// or from 18:00), matching first-launch behavior.
    #[must_use]
    pub fn default_for_hour(local_hour: u32) -> Self {
        Self {
            use_celsius: true,
            use_dark_theme: !(6..18).contains(&local_hour),
        }
    }
}

/// Convert a Celsius temperature to Fahrenheit for display
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(33.6844, 73.0479).is_ok());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());

        assert!(Coordinate::new(90.5, 0.0).is_err());
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_coordinate_format() {
        let coord = Coordinate::new(33.6844, 73.0479).unwrap();
        assert_eq!(coord.format(), "33.6844, 73.0479");
    }

    #[test]
    fn test_condition_wire_names() {
        let json = serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"Partly Cloudy\"");

        let condition: WeatherCondition = serde_json::from_str("\"Thunderstorm\"").unwrap();
        assert_eq!(condition, WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_city_record_wire_shape() {
        let raw = r#"{
            "name": "Islamabad",
            "country": "Pakistan",
            "temperature": 22.0,
            "condition": "Sunny",
            "humidity": 45,
            "windSpeed": 12.0,
            "coordinates": { "lat": 33.6844, "lon": 73.0479 }
        }"#;

        let record: CityRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.name, "Islamabad");
        assert_eq!(record.wind_speed, 12.0);
        let coord = record.coordinates.unwrap();
        assert_eq!(coord.latitude, 33.6844);
        assert_eq!(coord.longitude, 73.0479);
    }

    #[test]
    fn test_city_record_without_coordinates() {
        let raw = r#"{
            "name": "Nairobi",
            "country": "Kenya",
            "temperature": 23.0,
            "condition": "Partly Cloudy",
            "humidity": 62,
            "windSpeed": 12.0
        }"#;

        let record: CityRecord = serde_json::from_str(raw).unwrap();
        assert!(record.coordinates.is_none());
    }

    #[rstest]
    #[case(0, true)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(12, false)]
    #[case(17, false)]
    #[case(18, true)]
    #[case(23, true)]
    fn test_default_theme_for_hour(#[case] hour: u32, #[case] expect_dark: bool) {
        let settings = Settings::default_for_hour(hour);
        assert!(settings.use_celsius);
        assert_eq!(settings.use_dark_theme, expect_dark);
    }

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }
}
