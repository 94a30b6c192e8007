//! Application service wiring the catalog, resolver, and preferences
//!
//! One `WeatherApp` is constructed at startup and handed to whatever UI
//! layer consumes it. It replaces the hidden shared-context pattern with an
//! explicit object: no global mutable state is involved.

use crate::catalog::CityCatalog;
use crate::error::CityWeatherError;
use crate::geolocation::{GeolocationProvider, PermissionStatus};
use crate::models::CityRecord;
use crate::preferences::PreferenceStore;
use crate::resolver::LocationResolver;
use crate::storage::DurableStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Top-level application service
pub struct WeatherApp {
    catalog: Arc<CityCatalog>,
    preferences: PreferenceStore,
    geolocation: Box<dyn GeolocationProvider>,
    fallback_city: String,
    current_city: Option<CityRecord>,
    offline: bool,
}

impl WeatherApp {
    /// Wire the service together. The catalog is loaded once by the caller
    /// and shared read-only from here on.
    #[must_use]
    pub fn new(
        catalog: Arc<CityCatalog>,
        store: Arc<dyn DurableStore>,
        geolocation: Box<dyn GeolocationProvider>,
        fallback_city: impl Into<String>,
    ) -> Self {
        Self {
            preferences: PreferenceStore::new(catalog.clone(), store),
            catalog,
            geolocation,
            fallback_city: fallback_city.into(),
            current_city: None,
            offline: false,
        }
    }

    /// Restore persisted state and pick the startup city: the most recent
    /// search when one exists, otherwise the city nearest to the device
    /// location, otherwise the configured fallback.
    pub async fn start(&mut self) {
        self.preferences.initialize().await;

        if let Some(last) = self.preferences.recent_searches().first().cloned() {
            debug!("Starting with most recent search: {}", last);
            self.current_city = self.preferences.get_by_city_name(&last);
            if self.current_city.is_some() {
                return;
            }
            warn!("Recent search '{}' no longer matches the catalog", last);
        }

        match self.nearest_to_device().await {
            Some(city) => {
                info!("Starting with nearest city: {}", city.name);
                self.preferences.add_recent_search(&city.name);
                self.current_city = Some(city);
            }
            None => {
                debug!("Falling back to configured city: {}", self.fallback_city);
                // Viewing the fallback is not a user search, so it is not
                // recorded in the history.
                let fallback = self.fallback_city.clone();
                self.current_city = self.preferences.get_by_city_name(&fallback);
                if self.current_city.is_none() {
                    warn!("Fallback city '{}' is not in the catalog", self.fallback_city);
                }
            }
        }
    }

    /// Nearest catalog city to the device position, `None` on permission
    /// denial or any location failure
    async fn nearest_to_device(&self) -> Option<CityRecord> {
        match self.geolocation.request_permission().await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                debug!("Location permission denied");
                return None;
            }
            Err(e) => {
                warn!("Location permission request failed: {}", e);
                return None;
            }
        }

        let coord = match self.geolocation.current_coordinate().await {
            Ok(coord) => coord,
            Err(e) => {
                warn!("Could not get device coordinate: {}", e);
                return None;
            }
        };

        match LocationResolver::resolve_nearest(&coord, &self.catalog) {
            Ok(city) => city.cloned(),
            Err(e) => {
                warn!("Device reported an invalid coordinate: {}", e);
                None
            }
        }
    }

    /// User picked a city from search or the map: record it and make it
    /// current. Returns the record, or an error for unknown names.
    pub fn select_city(&mut self, name: &str) -> Result<CityRecord, CityWeatherError> {
        let Some(record) = self.preferences.get_by_city_name(name) else {
            return Err(CityWeatherError::catalog(format!("unknown city: {name}")));
        };
        // Record the canonical catalog spelling, not the typed query
        self.preferences.add_recent_search(&record.name);
        self.current_city = Some(record.clone());
        Ok(record)
    }

    /// Currently displayed city, if any
    #[must_use]
    pub fn current_city(&self) -> Option<&CityRecord> {
        self.current_city.as_ref()
    }

    /// Recent search history hydrated into full records, skipping names no
    /// longer present in the catalog
    pub fn recent_search_records(&mut self) -> Vec<CityRecord> {
        let names: Vec<String> = self.preferences.recent_searches().to_vec();
        names
            .iter()
            .filter_map(|name| self.preferences.get_by_city_name(name))
            .collect()
    }

    /// Favorite cities hydrated into full records
    pub fn favorite_records(&mut self) -> Vec<CityRecord> {
        let mut names: Vec<String> = self.preferences.favorites().iter().cloned().collect();
        names.sort();
        names
            .iter()
            .filter_map(|name| self.preferences.get_by_city_name(name))
            .collect()
    }

    /// Preference state and mutations
    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut PreferenceStore {
        &mut self.preferences
    }

    /// Network reachability flag, set by the reachability collaborator.
    /// The core only carries it for the UI's cached-data indicator.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn set_offline(&mut self, offline: bool) {
        if self.offline != offline {
            info!("Reachability changed: offline = {}", offline);
        }
        self.offline = offline;
    }

    /// Flush pending durable writes before the process exits
    pub async fn shutdown(&self) {
        self.preferences.flush().await;
    }
}
