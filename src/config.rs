//! Runtime configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::demo_data::{available_networks, network_by_name};
use crate::routing::ORS_BASE_URL;

/// Default listen address.
const DEFAULT_BIND: ([u8; 4], u16) = ([0, 0, 0, 0], 7860);

/// Default route cache file, relative to the working directory.
const DEFAULT_ROUTE_CACHE: &str = "rutas.json";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind: SocketAddr,
    /// Demo network to serve, one of [`available_networks`].
    pub network: String,
    /// Path of the JSON route cache.
    pub route_cache: PathBuf,
    /// OpenRouteService API key. Without it only cached routes are served.
    pub ors_api_key: Option<String>,
    /// OpenRouteService base URL.
    pub ors_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            network: available_networks()[0].to_string(),
            route_cache: PathBuf::from(DEFAULT_ROUTE_CACHE),
            ors_api_key: None,
            ors_base_url: ORS_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `CITY_GRAPH_BIND`, `CITY_GRAPH_NETWORK`, `CITY_GRAPH_ROUTE_CACHE`,
    /// `ORS_API_KEY` and `ORS_BASE_URL`, falling back to defaults.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(bind) = lookup("CITY_GRAPH_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| format!("invalid CITY_GRAPH_BIND {:?}: {}", bind, e))?;
        }
        if let Some(network) = lookup("CITY_GRAPH_NETWORK").filter(|n| !n.trim().is_empty()) {
            let network = network.trim().to_uppercase();
            if network_by_name(&network).is_none() {
                return Err(format!(
                    "unknown CITY_GRAPH_NETWORK {:?}, expected one of {:?}",
                    network,
                    available_networks()
                ));
            }
            config.network = network;
        }
        if let Some(path) = lookup("CITY_GRAPH_ROUTE_CACHE").filter(|p| !p.trim().is_empty()) {
            config.route_cache = PathBuf::from(path);
        }
        config.ors_api_key = lookup("ORS_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("ORS_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.ors_base_url = url;
        }

        Ok(config)
    }
}
