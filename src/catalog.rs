//! City Catalog Module
//!
//! Loads the bundled static city data and exposes name-based lookup and
//! substring search over it. The catalog is immutable for the lifetime of
//! the process; every other component shares it read-only.

use crate::error::CityWeatherError;
use crate::models::CityRecord;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Bundled catalog data, fixed configuration rather than runtime state
const CATALOG_JSON: &str = include_str!("../assets/cities.json");

#[derive(Deserialize)]
struct CatalogFile {
    cities: Vec<CityRecord>,
}

/// Immutable ordered list of known cities
#[derive(Debug, Clone)]
pub struct CityCatalog {
    cities: Vec<CityRecord>,
}

impl CityCatalog {
    /// Load the bundled catalog. Called once at startup; a malformed
    /// catalog is a fatal error since nothing works without it.
    pub fn load() -> Result<Self, CityWeatherError> {
        let catalog = Self::from_json(CATALOG_JSON)?;
        info!("Loaded city catalog with {} entries", catalog.len());
        Ok(catalog)
    }

    /// Parse and validate a catalog from raw JSON
    pub fn from_json(raw: &str) -> Result<Self, CityWeatherError> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| CityWeatherError::catalog(format!("malformed catalog data: {e}")))?;
        Self::validate(&file.cities)?;
        Ok(Self {
            cities: file.cities,
        })
    }

    fn validate(cities: &[CityRecord]) -> Result<(), CityWeatherError> {
        let mut seen = HashSet::new();
        for city in cities {
            if city.name.trim().is_empty() {
                return Err(CityWeatherError::catalog("catalog entry with empty name"));
            }
            if !seen.insert(city.name.to_lowercase()) {
                return Err(CityWeatherError::catalog(format!(
                    "duplicate catalog entry: {}",
                    city.name
                )));
            }
            if city.humidity > 100 {
                return Err(CityWeatherError::catalog(format!(
                    "{}: humidity {} exceeds 100%",
                    city.name, city.humidity
                )));
            }
            if !city.wind_speed.is_finite() || city.wind_speed < 0.0 {
                return Err(CityWeatherError::catalog(format!(
                    "{}: invalid wind speed {}",
                    city.name, city.wind_speed
                )));
            }
            if let Some(coord) = &city.coordinates {
                coord.validate().map_err(|e| {
                    CityWeatherError::catalog(format!("{}: {e}", city.name))
                })?;
            }
        }
        Ok(())
    }

    /// Case-insensitive exact match against city names
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&CityRecord> {
        let needle = name.trim().to_lowercase();
        self.cities
            .iter()
            .find(|city| city.name.to_lowercase() == needle)
    }

    /// Case-insensitive substring search against city and country names,
    /// in catalog order. Result count is unbounded; capping the list for
    /// display is a UI concern.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&CityRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let matches: Vec<&CityRecord> = self
            .cities
            .iter()
            .filter(|city| {
                city.name.to_lowercase().contains(&needle)
                    || city.country.to_lowercase().contains(&needle)
            })
            .collect();

        debug!("Search '{}' matched {} cities", query, matches.len());
        matches
    }

    /// Full catalog contents in load order
    #[must_use]
    pub fn cities(&self) -> &[CityRecord] {
        &self.cities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
