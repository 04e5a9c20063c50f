//! Road geometry between cities, cached in memory and on disk.
//!
//! [`RouteService`] answers "what does the road from A to B look like" with a
//! polyline. Lookups go through two tiers before touching the network:
//! 1. In-memory map (instant, per-process)
//! 2. JSON file loaded at startup (persists across restarts)
//!
//! On a miss the injected [`RouteResolver`] is called once; a successful
//! result is kept in memory and merged into the file. Failures are never
//! cached, so a later call retries.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::domain::CityNode;
use crate::geometry::{haversine_km, GeoPoint};

/// Default OpenRouteService endpoint.
pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// Error type for route resolution and cache persistence.
#[derive(Debug)]
pub enum RoutingError {
    /// Request could not be sent or the connection failed.
    Network(String),
    /// The routing API answered with a non-success status.
    Status(u16, String),
    /// Response body did not have the expected shape.
    Parse(String),
    /// Response parsed but held fewer than two points.
    EmptyRoute,
    /// No routing API is configured; only cached routes are available.
    Disabled,
    /// I/O error on the cache file.
    Io(std::io::Error),
}

impl RoutingError {
    /// True for failures of the remote resolver, as opposed to local I/O.
    pub fn is_resolution_failure(&self) -> bool {
        !matches!(self, RoutingError::Io(_))
    }
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::Network(msg) => write!(f, "Network error: {}", msg),
            RoutingError::Status(code, reason) => write!(f, "Routing API returned {} {}", code, reason),
            RoutingError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RoutingError::EmptyRoute => write!(f, "Routing API returned an empty route"),
            RoutingError::Disabled => write!(f, "No routing API configured"),
            RoutingError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for RoutingError {}

impl From<std::io::Error> for RoutingError {
    fn from(e: std::io::Error) -> Self {
        RoutingError::Io(e)
    }
}

/// Fetches the driving polyline between two coordinates.
pub trait RouteResolver: Send + Sync {
    fn resolve(&self, from: GeoPoint, to: GeoPoint) -> BoxFuture<'_, Result<Vec<GeoPoint>, RoutingError>>;
}

/// Resolver used when no routing API is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledResolver;

impl RouteResolver for DisabledResolver {
    fn resolve(&self, _from: GeoPoint, _to: GeoPoint) -> BoxFuture<'_, Result<Vec<GeoPoint>, RoutingError>> {
        async { Err(RoutingError::Disabled) }.boxed()
    }
}

/// Resolver backed by the OpenRouteService directions API (driving-car).
pub struct OpenRouteServiceResolver {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteServiceResolver {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("city-graph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RoutingError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn fetch(&self, from: GeoPoint, to: GeoPoint) -> Result<Vec<GeoPoint>, RoutingError> {
        let url = format!("{}/v2/directions/driving-car", self.base_url);
        // The API takes "lng,lat"
        let start = format!("{},{}", from.lng, from.lat);
        let end = format!("{},{}", to.lng, to.lat);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("start", start.as_str()), ("end", end.as_str())])
            .send()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").to_string(),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::Network(e.to_string()))?;

        parse_directions(&body)
    }
}

impl RouteResolver for OpenRouteServiceResolver {
    fn resolve(&self, from: GeoPoint, to: GeoPoint) -> BoxFuture<'_, Result<Vec<GeoPoint>, RoutingError>> {
        self.fetch(from, to).boxed()
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    geometry: DirectionsGeometry,
}

#[derive(Debug, Deserialize)]
struct DirectionsGeometry {
    /// `[lng, lat]` or `[lng, lat, elevation]`.
    coordinates: Vec<Vec<f64>>,
}

/// Extracts the polyline of the first feature of a GeoJSON directions body.
pub fn parse_directions(body: &str) -> Result<Vec<GeoPoint>, RoutingError> {
    let parsed: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Parse(e.to_string()))?;

    let feature = parsed
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Parse("response has no features".into()))?;

    feature
        .geometry
        .coordinates
        .iter()
        .map(|c| match c.as_slice() {
            [lng, lat, ..] => Ok(GeoPoint::new(*lat, *lng)),
            _ => Err(RoutingError::Parse(format!("coordinate with {} values", c.len()))),
        })
        .collect()
}

/// Outcome of reading the cache file at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLoad {
    /// No cache file existed.
    Missing,
    /// The file held this many routes.
    Loaded(usize),
    /// The file was unusable and has been deleted.
    Corrupt(String),
}

/// On-disk table; a `BTreeMap` keeps the file diff-friendly.
type StoredTable = BTreeMap<String, Vec<GeoPoint>>;

/// Builds the cache key for a directed city pair.
///
/// `A-B` and `B-A` are different keys.
///
/// ```
/// use city_graph::routing::route_key;
///
/// assert_eq!(route_key("Santa Ana", "Sonsonate"), "Santa Ana-Sonsonate");
/// ```
pub fn route_key(origin: &str, destination: &str) -> String {
    format!("{}-{}", origin, destination)
}

/// Cache-backed route geometry service.
///
/// Safe to share between tasks: the in-memory map sits behind a read-write
/// lock and file writes are serialized by a per-instance mutex, so two
/// concurrent misses for different pairs both end up in the file.
pub struct RouteService {
    resolver: Arc<dyn RouteResolver>,
    store_path: PathBuf,
    cache: RwLock<HashMap<String, Vec<GeoPoint>>>,
    save_lock: Mutex<()>,
    load: CacheLoad,
}

impl RouteService {
    /// Creates the service and loads any existing cache file.
    ///
    /// An unusable file is deleted and the service starts empty; this never
    /// fails.
    pub async fn open(resolver: Arc<dyn RouteResolver>, store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        let (table, load) = load_store(&store_path).await;

        match &load {
            CacheLoad::Missing => info!("No route cache at {:?}, starting empty", store_path),
            CacheLoad::Loaded(n) => info!("Loaded {} cached routes from {:?}", n, store_path),
            CacheLoad::Corrupt(reason) => warn!("Route cache {:?} discarded: {}", store_path, reason),
        }

        Self {
            resolver,
            store_path,
            cache: RwLock::new(table.into_iter().collect()),
            save_lock: Mutex::new(()),
            load,
        }
    }

    /// What happened when the cache file was read at startup.
    pub fn load_outcome(&self) -> &CacheLoad {
        &self.load
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Number of routes held in memory.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Returns true if the directed pair is already cached.
    pub fn contains(&self, origin: &CityNode, destination: &CityNode) -> bool {
        self.cache
            .read()
            .contains_key(&route_key(origin.name(), destination.name()))
    }

    /// Road geometry from `origin` to `destination`, or `None` if unavailable.
    ///
    /// The failure cause is logged; use [`RouteService::try_get_route`] to
    /// inspect it.
    pub async fn get_route(&self, origin: &CityNode, destination: &CityNode) -> Option<Vec<GeoPoint>> {
        match self.try_get_route(origin, destination).await {
            Ok(points) => Some(points),
            Err(e) => {
                error!("Error fetching route {} -> {}: {}", origin.name(), destination.name(), e);
                None
            }
        }
    }

    /// Road geometry from `origin` to `destination`.
    ///
    /// Serves from memory when possible; otherwise calls the resolver once and
    /// persists a successful result.
    pub async fn try_get_route(
        &self,
        origin: &CityNode,
        destination: &CityNode,
    ) -> Result<Vec<GeoPoint>, RoutingError> {
        let key = route_key(origin.name(), destination.name());

        let cached = self.cache.read().get(&key).cloned();
        if let Some(points) = cached {
            debug!("Route cache hit for {}", key);
            return Ok(points);
        }

        debug!("Route cache miss for {}, calling resolver", key);
        let points = self.resolver.resolve(origin.point(), destination.point()).await?;
        if points.len() < 2 {
            return Err(RoutingError::EmptyRoute);
        }

        self.cache.write().insert(key.clone(), points.clone());

        if let Err(e) = self.save_route(&key, &points).await {
            // The route is still served from memory for this process
            warn!("Failed to persist route {} to {:?}: {}", key, self.store_path, e);
        }

        Ok(points)
    }

    /// Straight-line distance between two cities in kilometers.
    ///
    /// Independent of any cached geometry; summing this along a path gives the
    /// great-circle total, not the driven distance.
    pub fn get_distance(&self, from: &CityNode, to: &CityNode) -> f64 {
        haversine_km(from.point(), to.point())
    }

    /// Merges one route into the cache file with a full read-modify-write.
    async fn save_route(&self, key: &str, points: &[GeoPoint]) -> Result<(), RoutingError> {
        let _guard = self.save_lock.lock().await;

        let mut table = match read_table(&self.store_path).await {
            Ok(Some(table)) => table,
            Ok(None) => StoredTable::new(),
            Err(reason) => {
                warn!("Overwriting unreadable route cache {:?}: {}", self.store_path, reason);
                StoredTable::new()
            }
        };
        table.insert(key.to_string(), points.to_vec());

        if let Some(parent) = self.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_string_pretty(&table).map_err(|e| RoutingError::Parse(e.to_string()))?;
        tokio::fs::write(&self.store_path, data).await?;
        debug!("Saved route {} ({} routes on disk)", key, table.len());

        Ok(())
    }
}

/// Reads the cache file. `Ok(None)` when it does not exist; `Err` with a
/// reason when it exists but is unusable.
async fn read_table(path: &Path) -> Result<Option<StoredTable>, String> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }

    let meta = tokio::fs::metadata(path).await.map_err(|e| e.to_string())?;
    if meta.len() == 0 {
        return Err("file is empty".into());
    }

    let data = tokio::fs::read_to_string(path).await.map_err(|e| e.to_string())?;
    if data.trim().is_empty() {
        return Err("file contains only whitespace".into());
    }

    let table: StoredTable = serde_json::from_str(&data).map_err(|e| e.to_string())?;
    if table.is_empty() {
        return Err("table is empty".into());
    }

    Ok(Some(table))
}

/// Startup load: any unusable file is deleted and reported as corrupt.
async fn load_store(path: &Path) -> (StoredTable, CacheLoad) {
    match read_table(path).await {
        Ok(None) => (StoredTable::new(), CacheLoad::Missing),
        Ok(Some(table)) => {
            let n = table.len();
            (table, CacheLoad::Loaded(n))
        }
        Err(reason) => {
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!("Could not delete corrupt route cache {:?}: {}", path, e);
            }
            (StoredTable::new(), CacheLoad::Corrupt(reason))
        }
    }
}
