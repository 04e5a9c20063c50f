//! Demo network of the main cities of El Salvador.
//!
//! Fourteen department capitals and the road connections between them. The
//! connection lists are applied through the public graph API only: names are
//! resolved with `find_by_name`, unknown names are skipped, and a pair that
//! is already connected in either direction is not added twice.

use tracing::warn;

use crate::domain::{CityNode, Graph};

/// City name with coordinates.
struct CityData {
    name: &'static str,
    lat: f64,
    lng: f64,
}

const EL_SALVADOR_CITIES: &[CityData] = &[
    CityData { name: "San Salvador", lat: 13.6929, lng: -89.2182 },
    CityData { name: "Santa Ana", lat: 13.9946, lng: -89.5597 },
    CityData { name: "San Miguel", lat: 13.4833, lng: -88.1833 },
    CityData { name: "Santa Tecla (Nueva San Salvador)", lat: 13.6769, lng: -89.2797 },
    CityData { name: "Sonsonate", lat: 13.7186, lng: -89.7245 },
    CityData { name: "Ahuachapán", lat: 13.9214, lng: -89.8450 },
    CityData { name: "Chalatenango", lat: 14.0333, lng: -88.9333 },
    CityData { name: "Sensuntepeque", lat: 13.876184, lng: -88.628492 },
    CityData { name: "Zacatecoluca", lat: 13.507316, lng: -88.870206 },
    CityData { name: "Cojutepeque", lat: 13.721740, lng: -88.934541 },
    CityData { name: "San Vicente", lat: 13.6333, lng: -88.7833 },
    CityData { name: "Usulután", lat: 13.3500, lng: -88.4500 },
    CityData { name: "San Francisco Gotera", lat: 13.695215, lng: -88.106073 },
    CityData { name: "La Unión", lat: 13.5000, lng: -87.8833 },
];

const EL_SALVADOR_CONNECTIONS: &[(&str, &[&str])] = &[
    ("Ahuachapán", &["Santa Ana", "Sonsonate"]),
    ("Sensuntepeque", &["San Vicente", "San Francisco Gotera"]),
    ("Chalatenango", &["Santa Ana", "Cojutepeque", "San Salvador", "Sensuntepeque"]),
    ("Cojutepeque", &["San Vicente", "San Salvador"]),
    ("Santa Tecla (Nueva San Salvador)", &["San Salvador", "Sonsonate", "Santa Ana"]),
    ("Zacatecoluca", &["San Vicente", "San Salvador", "Usulután"]),
    ("La Unión", &["San Francisco Gotera", "San Miguel"]),
    ("San Miguel", &["San Francisco Gotera", "Usulután", "San Vicente"]),
    ("Santa Ana", &["Sonsonate"]),
];

/// Returns available demo network names.
pub fn available_networks() -> &'static [&'static str] {
    &["EL_SALVADOR"]
}

/// Builds a demo network by name (case-insensitive).
pub fn network_by_name(name: &str) -> Option<Graph> {
    match name.to_uppercase().as_str() {
        "EL_SALVADOR" => Some(el_salvador()),
        _ => None,
    }
}

/// Builds the El Salvador city network.
///
/// # Examples
///
/// ```
/// use city_graph::demo_data::el_salvador;
///
/// let graph = el_salvador();
/// assert_eq!(graph.node_count(), 14);
/// assert_eq!(graph.edge_count(), 22);
/// assert!(graph.find_by_name("la unión").is_some());
/// ```
pub fn el_salvador() -> Graph {
    let cities = EL_SALVADOR_CITIES
        .iter()
        .map(|c| (c.name, c.lat, c.lng));
    build_graph(cities, EL_SALVADOR_CONNECTIONS)
}

/// Builds a graph from `(name, lat, lng)` triples and named adjacency lists.
///
/// Connections naming an unknown city are skipped with a warning; a pair
/// already connected in either direction is not added again.
pub fn build_graph<'a>(
    cities: impl IntoIterator<Item = (&'a str, f64, f64)>,
    connections: &[(&str, &[&str])],
) -> Graph {
    let mut graph = Graph::new();
    for (name, lat, lng) in cities {
        graph.add_node(CityNode::new(name, lat, lng));
    }

    for &(from_name, targets) in connections {
        let Some(from) = graph.find_by_name(from_name) else {
            warn!("Skipping connections from unknown city {}", from_name);
            continue;
        };
        for &to_name in targets {
            let Some(to) = graph.find_by_name(to_name) else {
                warn!("Skipping connection {} -> unknown city {}", from_name, to_name);
                continue;
            };
            if graph.has_edge_between(from, to) {
                continue;
            }
            // Both handles come from find_by_name on this graph
            if let Err(e) = graph.add_edge(from, to) {
                warn!("Skipping connection {} -> {}: {}", from_name, to_name, e);
            }
        }
    }

    graph
}
