//! Preference Store Module
//!
//! Durable, bounded, de-duplicated user-preference state plus a derived
//! weather cache. The in-memory copy is authoritative from the moment a
//! mutation returns; durable writes happen in the background and are
//! best-effort. Each logical key gets its own writer task fed by a queue,
//! so writes to the same key can never overtake each other while writes to
//! different keys interleave freely.

use crate::catalog::CityCatalog;
use crate::models::{CityRecord, Settings};
use crate::storage::DurableStore;
use chrono::{Local, Timelike};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Upper bound on the recent-search history.
///
/// Earlier app versions kept 5 entries; the most complete one keeps 10,
/// which is what this implementation uses.
pub const MAX_RECENT_SEARCHES: usize = 10;

/// Logical durable-store keys owned by the preference store
pub mod keys {
    pub const RECENT_SEARCHES: &str = "recentSearches";
    pub const FAVORITES: &str = "favorites";
    pub const SETTINGS: &str = "settings";
    pub const WEATHER_CACHE: &str = "weatherCache";
}

enum WriteOp {
    Put(String),
    Remove,
    Flush(oneshot::Sender<()>),
}

/// Single-key write queue. One background task drains operations in order,
/// which preserves write ordering for that key.
struct KeyWriter {
    key: &'static str,
    tx: mpsc::UnboundedSender<WriteOp>,
}

impl KeyWriter {
    fn spawn(store: Arc<dyn DurableStore>, key: &'static str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    WriteOp::Put(json) => {
                        if let Err(e) = store.put(key, json).await {
                            warn!("Failed to persist '{}': {}", key, e);
                        }
                    }
                    WriteOp::Remove => {
                        if let Err(e) = store.remove(key).await {
                            warn!("Failed to remove '{}': {}", key, e);
                        }
                    }
                    WriteOp::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
        });
        Self { key, tx }
    }

    fn put(&self, json: String) {
        if self.tx.send(WriteOp::Put(json)).is_err() {
            warn!("Writer for '{}' is gone, dropping write", self.key);
        }
    }

    fn remove(&self) {
        if self.tx.send(WriteOp::Remove).is_err() {
            warn!("Writer for '{}' is gone, dropping remove", self.key);
        }
    }

    /// Wait until every operation enqueued before this call has been applied
    async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriteOp::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Owner of recent searches, favorites, settings, and the weather cache,
/// and the sole writer to their durable-store keys
pub struct PreferenceStore {
    catalog: Arc<CityCatalog>,
    store: Arc<dyn DurableStore>,
    recent_searches: Vec<String>,
    favorites: HashSet<String>,
    settings: Settings,
    weather_cache: HashMap<String, CityRecord>,
    recent_writer: KeyWriter,
    favorites_writer: KeyWriter,
    settings_writer: KeyWriter,
    cache_writer: KeyWriter,
}

impl PreferenceStore {
    /// Create a store with first-launch defaults. Call [`initialize`] to
    /// restore persisted state. Must run inside a tokio runtime since the
    /// per-key writer tasks are spawned here.
    ///
    /// [`initialize`]: PreferenceStore::initialize
    #[must_use]
    pub fn new(catalog: Arc<CityCatalog>, store: Arc<dyn DurableStore>) -> Self {
        Self {
            catalog,
            recent_searches: Vec::new(),
            favorites: HashSet::new(),
            settings: Settings::default_for_hour(Local::now().hour()),
            weather_cache: HashMap::new(),
            recent_writer: KeyWriter::spawn(store.clone(), keys::RECENT_SEARCHES),
            favorites_writer: KeyWriter::spawn(store.clone(), keys::FAVORITES),
            settings_writer: KeyWriter::spawn(store.clone(), keys::SETTINGS),
            cache_writer: KeyWriter::spawn(store.clone(), keys::WEATHER_CACHE),
            store,
        }
    }

    /// Restore all four resources from the durable store. The reads are
    /// issued concurrently; a missing or malformed value for one key falls
    /// back to its default without affecting the others.
    pub async fn initialize(&mut self) {
        let (searches, favorites, settings, cache) = tokio::join!(
            self.load_key::<Vec<String>>(keys::RECENT_SEARCHES),
            self.load_key::<HashSet<String>>(keys::FAVORITES),
            self.load_key::<Settings>(keys::SETTINGS),
            self.load_key::<HashMap<String, CityRecord>>(keys::WEATHER_CACHE),
        );

        if let Some(mut searches) = searches {
            searches.truncate(MAX_RECENT_SEARCHES);
            self.recent_searches = searches;
        }
        if let Some(favorites) = favorites {
            self.favorites = favorites;
        }
        if let Some(settings) = settings {
            self.settings = settings;
        }
        if let Some(cache) = cache {
            self.weather_cache = cache;
        }

        info!(
            "Preference store initialized: {} recent searches, {} favorites, {} cached cities",
            self.recent_searches.len(),
            self.favorites.len(),
            self.weather_cache.len()
        );
    }

    async fn load_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Stored value under '{}' is malformed, using default: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read '{}' from durable store: {}", key, e);
                None
            }
        }
    }

    fn enqueue_snapshot<T: Serialize>(writer: &KeyWriter, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => writer.put(json),
            Err(e) => warn!("Failed to serialize '{}' snapshot: {}", writer.key, e),
        }
    }

    /// Record a city as the most recent search. Re-searching a city moves
    /// it to the front instead of duplicating it; the history never grows
    /// past [`MAX_RECENT_SEARCHES`].
    pub fn add_recent_search(&mut self, city_name: &str) {
        self.recent_searches.retain(|s| s != city_name);
        self.recent_searches.insert(0, city_name.to_string());
        self.recent_searches.truncate(MAX_RECENT_SEARCHES);
        Self::enqueue_snapshot(&self.recent_writer, &self.recent_searches);

        self.warm_cache(city_name);
    }

    /// Empty the search history and remove its durable key entirely, so a
    /// cold start cannot tell a cleared history from a never-used one by a
    /// stored-but-empty array.
    pub fn clear_recent_searches(&mut self) {
        self.recent_searches.clear();
        self.recent_writer.remove();
        debug!("Recent searches cleared");
    }

    /// Toggle a city's membership in the favorites set
    pub fn toggle_favorite(&mut self, city_name: &str) {
        if !self.favorites.remove(city_name) {
            self.favorites.insert(city_name.to_string());
        }
        Self::enqueue_snapshot(&self.favorites_writer, &self.favorites);
    }

    /// Flip the temperature unit. The whole settings object is persisted so
    /// a back-to-back unit and theme toggle cannot lose either flag.
    pub fn toggle_temperature_unit(&mut self) {
        self.settings.use_celsius = !self.settings.use_celsius;
        Self::enqueue_snapshot(&self.settings_writer, &self.settings);
    }

    /// Flip the UI theme; persists the whole settings object
    pub fn toggle_theme(&mut self) {
        self.settings.use_dark_theme = !self.settings.use_dark_theme;
        Self::enqueue_snapshot(&self.settings_writer, &self.settings);
    }

    /// Look a city up by name, weather cache first, catalog on a miss.
    /// A catalog hit populates the cache before returning.
    pub fn get_by_city_name(&mut self, name: &str) -> Option<CityRecord> {
        let key = name.trim().to_lowercase();
        if let Some(hit) = self.weather_cache.get(&key) {
            debug!("Cache hit for '{}'", name);
            return Some(hit.clone());
        }

        let record = self.catalog.find_by_name(name)?.clone();
        self.weather_cache.insert(key, record.clone());
        Self::enqueue_snapshot(&self.cache_writer, &self.weather_cache);
        Some(record)
    }

    /// Case-insensitive substring search over the catalog
    #[must_use]
    pub fn search_suggestions(&self, query: &str) -> Vec<&CityRecord> {
        self.catalog.search(query)
    }

    fn warm_cache(&mut self, city_name: &str) {
        let key = city_name.trim().to_lowercase();
        if self.weather_cache.contains_key(&key) {
            return;
        }
        if let Some(record) = self.catalog.find_by_name(city_name) {
            self.weather_cache.insert(key, record.clone());
            Self::enqueue_snapshot(&self.cache_writer, &self.weather_cache);
        }
    }

    /// Recent search history, most recent first
    #[must_use]
    pub fn recent_searches(&self) -> &[String] {
        &self.recent_searches
    }

    /// Current favorites set
    #[must_use]
    pub fn favorites(&self) -> &HashSet<String> {
        &self.favorites
    }

    #[must_use]
    pub fn is_favorite(&self, city_name: &str) -> bool {
        self.favorites.contains(city_name)
    }

    /// Current settings snapshot
    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Wait for every durable write enqueued so far to be applied. Used at
    /// shutdown and by tests simulating a cold start.
    pub async fn flush(&self) {
        futures::join!(
            self.recent_writer.flush(),
            self.favorites_writer.flush(),
            self.settings_writer.flush(),
            self.cache_writer.flush(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CityWeatherError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    fn test_prefs() -> (PreferenceStore, Arc<MemoryStore>) {
        let catalog = Arc::new(CityCatalog::load().unwrap());
        let store = Arc::new(MemoryStore::new());
        let prefs = PreferenceStore::new(catalog, store.clone());
        (prefs, store)
    }

    #[tokio::test]
    async fn test_recent_search_moves_duplicate_to_front() {
        let (mut prefs, _store) = test_prefs();

        prefs.add_recent_search("Lahore");
        prefs.add_recent_search("Karachi");
        prefs.add_recent_search("Lahore");

        assert_eq!(prefs.recent_searches(), &["Lahore", "Karachi"]);
    }

    #[tokio::test]
    async fn test_recent_search_is_idempotent_in_content() {
        let (mut prefs, _store) = test_prefs();

        prefs.add_recent_search("Tokyo");
        prefs.add_recent_search("Tokyo");

        assert_eq!(prefs.recent_searches(), &["Tokyo"]);
    }

    #[tokio::test]
    async fn test_recent_search_bound_is_enforced() {
        let (mut prefs, _store) = test_prefs();

        for i in 0..25 {
            prefs.add_recent_search(&format!("City {i}"));
        }

        assert_eq!(prefs.recent_searches().len(), MAX_RECENT_SEARCHES);
        // Most recent at the front, oldest evicted
        assert_eq!(prefs.recent_searches()[0], "City 24");
        assert!(!prefs.recent_searches().contains(&"City 0".to_string()));
    }

    #[tokio::test]
    async fn test_clear_removes_durable_key_entirely() {
        let (mut prefs, store) = test_prefs();

        prefs.add_recent_search("Paris");
        prefs.flush().await;
        assert!(store.contains_key(keys::RECENT_SEARCHES));

        prefs.clear_recent_searches();
        prefs.flush().await;

        assert!(prefs.recent_searches().is_empty());
        // The key is gone, not a stored-but-empty array
        assert!(!store.contains_key(keys::RECENT_SEARCHES));
    }

    #[tokio::test]
    async fn test_toggle_favorite_is_an_involution() {
        let (mut prefs, store) = test_prefs();

        prefs.toggle_favorite("Sydney");
        assert!(prefs.is_favorite("Sydney"));

        prefs.toggle_favorite("Sydney");
        assert!(!prefs.is_favorite("Sydney"));
        assert!(prefs.favorites().is_empty());

        prefs.flush().await;
        let raw = store.contents()[keys::FAVORITES].clone();
        let persisted: HashSet<String> = serde_json::from_str(&raw).unwrap();
        assert!(persisted.is_empty());
    }

    #[tokio::test]
    async fn test_settings_persist_as_one_object() {
        let (mut prefs, store) = test_prefs();
        let before = prefs.settings();

        prefs.toggle_temperature_unit();
        prefs.toggle_theme();
        prefs.flush().await;

        let raw = store.contents()[keys::SETTINGS].clone();
        let persisted: Settings = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.use_celsius, !before.use_celsius);
        assert_eq!(persisted.use_dark_theme, !before.use_dark_theme);
    }

    #[tokio::test]
    async fn test_cold_start_restores_persisted_state() {
        let catalog = Arc::new(CityCatalog::load().unwrap());
        let store = Arc::new(MemoryStore::new());

        {
            let mut prefs = PreferenceStore::new(catalog.clone(), store.clone());
            prefs.add_recent_search("Berlin");
            prefs.toggle_favorite("Tokyo");
            prefs.toggle_temperature_unit();
            prefs.flush().await;
        }

        let mut prefs = PreferenceStore::new(catalog, store);
        prefs.initialize().await;

        assert_eq!(prefs.recent_searches(), &["Berlin"]);
        assert!(prefs.is_favorite("Tokyo"));
        assert!(!prefs.settings().use_celsius);
    }

    #[tokio::test]
    async fn test_malformed_key_does_not_poison_others() {
        let catalog = Arc::new(CityCatalog::load().unwrap());
        let store = Arc::new(MemoryStore::new());
        store
            .put(keys::RECENT_SEARCHES, "not json{".to_string())
            .await
            .unwrap();
        store
            .put(keys::FAVORITES, "[\"Cairo\"]".to_string())
            .await
            .unwrap();

        let mut prefs = PreferenceStore::new(catalog, store);
        prefs.initialize().await;

        assert!(prefs.recent_searches().is_empty());
        assert!(prefs.is_favorite("Cairo"));
    }

    #[tokio::test]
    async fn test_lookup_populates_weather_cache() {
        let (mut prefs, store) = test_prefs();

        let record = prefs.get_by_city_name("islamabad").unwrap();
        assert_eq!(record.name, "Islamabad");

        prefs.flush().await;
        let raw = store.contents()[keys::WEATHER_CACHE].clone();
        let cache: HashMap<String, CityRecord> = serde_json::from_str(&raw).unwrap();
        assert!(cache.contains_key("islamabad"));

        // Second lookup is served from the cache
        let again = prefs.get_by_city_name("Islamabad").unwrap();
        assert_eq!(again, record);
    }

    #[tokio::test]
    async fn test_recent_search_warms_cache() {
        let (mut prefs, store) = test_prefs();

        prefs.add_recent_search("Dubai");
        prefs.flush().await;

        let raw = store.contents()[keys::WEATHER_CACHE].clone();
        let cache: HashMap<String, CityRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(cache["dubai"].name, "Dubai");
    }

    #[tokio::test]
    async fn test_unknown_city_neither_cached_nor_returned() {
        let (mut prefs, store) = test_prefs();

        assert!(prefs.get_by_city_name("Atlantis").is_none());
        prefs.flush().await;
        assert!(!store.contains_key(keys::WEATHER_CACHE));
    }

    #[tokio::test]
    async fn test_suggestions_delegate_to_catalog() {
        let (prefs, _store) = test_prefs();

        let suggestions = prefs.search_suggestions("pak");
        assert!(suggestions.iter().any(|c| c.name == "Islamabad"));
        assert!(prefs.search_suggestions("").is_empty());
    }

    /// Store whose writes always fail, for exercising best-effort persistence
    struct FailingStore;

    #[async_trait]
    impl DurableStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CityWeatherError> {
            Err(CityWeatherError::persistence("read failed"))
        }

        async fn put(&self, _key: &str, _value: String) -> Result<(), CityWeatherError> {
            Err(CityWeatherError::persistence("write failed"))
        }

        async fn remove(&self, _key: &str) -> Result<(), CityWeatherError> {
            Err(CityWeatherError::persistence("remove failed"))
        }
    }

    #[tokio::test]
    async fn test_persistence_failures_never_reach_the_caller() {
        let catalog = Arc::new(CityCatalog::load().unwrap());
        let mut prefs = PreferenceStore::new(catalog, Arc::new(FailingStore));

        prefs.initialize().await;
        prefs.add_recent_search("Moscow");
        prefs.toggle_favorite("Moscow");
        prefs.toggle_theme();
        prefs.clear_recent_searches();
        prefs.flush().await;

        // In-memory state stayed correct throughout
        assert!(prefs.recent_searches().is_empty());
        assert!(prefs.is_favorite("Moscow"));
    }
}
