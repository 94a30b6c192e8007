//! Location Resolution Module
//!
//! Resolves a device coordinate to the geodesically nearest catalog city.
//! A linear scan is deliberate: the catalog holds dozens of cities, so a
//! spatial index would buy nothing over a straight pass.

use crate::catalog::CityCatalog;
use crate::error::CityWeatherError;
use crate::models::{CityRecord, Coordinate};
use tracing::debug;

/// Service for resolving coordinates against the city catalog
pub struct LocationResolver;

impl LocationResolver {
    /// Find the catalog entry nearest to `coord` by great-circle distance.
    ///
    /// Entries without coordinates are skipped. Ties keep the first entry
    /// in catalog order. Returns `None` when no entry carries coordinates,
    /// and an error for an out-of-range input coordinate.
    pub fn resolve_nearest<'a>(
        coord: &Coordinate,
        catalog: &'a CityCatalog,
    ) -> Result<Option<&'a CityRecord>, CityWeatherError> {
        coord.validate()?;

        let mut nearest: Option<(&CityRecord, f64)> = None;
        for city in catalog.cities() {
            let Some(city_coord) = &city.coordinates else {
                continue;
            };

            let distance = Self::distance_km(coord, city_coord);
            // Strict comparison keeps the earlier entry on exact ties
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((city, distance)),
            }
        }

        if let Some((city, distance)) = nearest {
            debug!(
                "Resolved ({}) to {} at {:.1} km",
                coord.format(),
                city.name,
                distance
            );
            Ok(Some(city))
        } else {
            debug!("No catalog entry carries coordinates");
            Ok(None)
        }
    }

    /// Haversine great-circle distance between two coordinates in km
    #[must_use]
    pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: from.latitude,
                longitude: from.longitude,
            },
            haversine::Location {
                latitude: to.latitude,
                longitude: to.longitude,
            },
            haversine::Units::Kilometers,
        )
    }
}
