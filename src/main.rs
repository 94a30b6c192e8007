use anyhow::{Context, Result};
use cityweather::config::CityWeatherConfig;
use cityweather::geolocation::{FixedLocation, GeolocationProvider, NoLocation};
use cityweather::models::{Coordinate, celsius_to_fahrenheit};
use cityweather::storage::FjallStore;
use cityweather::{CityCatalog, CityRecord, WeatherApp};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = CityWeatherConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let catalog = Arc::new(CityCatalog::load().map_err(|e| {
        eprintln!("{}", e.user_message());
        anyhow::anyhow!(e)
    })?);

    let storage_path = config.storage_path();
    std::fs::create_dir_all(&storage_path)
        .with_context(|| format!("Failed to create storage directory {}", storage_path.display()))?;
    let store = Arc::new(FjallStore::open(&storage_path)?);

    // Optional "<lat> <lon>" arguments stand in for the device location
    let geolocation = device_location_from_args()?;

    let mut app = WeatherApp::new(catalog, store, geolocation, config.defaults.fallback_city);
    app.start().await;

    match app.current_city() {
        Some(city) => {
            let city = city.clone();
            print_city(&city, app.preferences().settings().use_celsius);
        }
        None => println!("No city could be resolved."),
    }

    let recents = app.recent_search_records();
    if !recents.is_empty() {
        println!("\nRecent searches:");
        for record in &recents {
            println!("  - {} ({})", record.name, record.country);
        }
    }

    let favorites = app.favorite_records();
    if !favorites.is_empty() {
        println!("\nFavorites:");
        for record in &favorites {
            println!("  - {} ({})", record.name, record.country);
        }
    }

    app.shutdown().await;
    Ok(())
}

fn device_location_from_args() -> Result<Box<dyn GeolocationProvider>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [lat, lon] => {
            let latitude: f64 = lat.parse().context("latitude must be a number")?;
            let longitude: f64 = lon.parse().context("longitude must be a number")?;
            let coord = Coordinate::new(latitude, longitude)?;
            Ok(Box::new(FixedLocation::new(coord)))
        }
        [] => Ok(Box::new(NoLocation)),
        _ => anyhow::bail!("usage: cityweather [<latitude> <longitude>]"),
    }
}

fn print_city(city: &CityRecord, use_celsius: bool) {
    let temperature = if use_celsius {
        format!("{:.0}°C", city.temperature)
    } else {
        format!("{:.0}°F", celsius_to_fahrenheit(city.temperature))
    };
    println!("{}, {}", city.name, city.country);
    println!("  {:?}, {}", city.condition, temperature);
    println!(
        "  Humidity {}%, wind {:.0} km/h",
        city.humidity, city.wind_speed
    );
}
