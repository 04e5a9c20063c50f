//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::algorithms::Path;
use crate::domain::{EdgeId, Graph, NodeId};
use crate::geometry::{encode_polyline, polyline_length_km, GeoPoint};

/// City with its location as `[latitude, longitude]`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CityDto {
    pub id: usize,
    pub name: String,
    pub location: [f64; 2],
}

impl CityDto {
    pub fn from_node(graph: &Graph, id: NodeId) -> Option<Self> {
        let node = graph.node(id).ok()?;
        Some(Self {
            id: id.index(),
            name: node.name().to_string(),
            location: node.point().into(),
        })
    }
}

/// Connection between two cities.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub id: usize,
    pub from: String,
    pub to: String,
    pub weight_km: f64,
}

impl EdgeDto {
    pub fn from_edge(graph: &Graph, id: EdgeId) -> Option<Self> {
        let edge = graph.edge(id)?;
        Some(Self {
            id: id.index(),
            from: graph.name_of(edge.from).to_string(),
            to: graph.name_of(edge.to).to_string(),
            weight_km: edge.weight_km,
        })
    }
}

/// Visit order of a BFS or DFS.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TraversalDto {
    /// "BFS" or "DFS".
    pub algorithm: String,
    pub start: String,
    /// City names in visit order.
    pub order: Vec<String>,
}

/// Origin/destination query parameters.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PairQuery {
    /// Origin city name (case-insensitive).
    pub from: String,
    /// Destination city name (case-insensitive).
    pub to: String,
}

/// One hop of a path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegDto {
    pub from: String,
    pub to: String,
    /// Straight-line distance of this hop.
    pub distance_km: f64,
}

/// Shortest path between two cities.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathDto {
    pub from: String,
    pub to: String,
    /// City names from origin to destination.
    pub cities: Vec<String>,
    pub legs: Vec<LegDto>,
    /// Sum of edge weights along the path.
    pub total_km: f64,
}

impl PathDto {
    pub fn from_path(graph: &Graph, path: &Path) -> Self {
        let name = |id: NodeId| graph.name_of(id).to_string();
        let legs = path
            .legs()
            .map(|(a, b)| LegDto {
                from: name(a),
                to: name(b),
                distance_km: match (graph.node(a), graph.node(b)) {
                    (Ok(x), Ok(y)) => x.distance_km(y),
                    _ => 0.0,
                },
            })
            .collect();

        Self {
            from: path.nodes.first().map(|&id| name(id)).unwrap_or_default(),
            to: path.nodes.last().map(|&id| name(id)).unwrap_or_default(),
            cities: path.nodes.iter().map(|&id| name(id)).collect(),
            legs,
            total_km: path.total_km,
        }
    }
}

/// Minimum spanning tree of the network.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpanningTreeDto {
    /// Accepted edges in Kruskal order.
    pub edges: Vec<EdgeDto>,
    pub total_km: f64,
    /// False when the network is disconnected and this is a spanning forest.
    pub spans_all_cities: bool,
}

/// Road geometry between two cities.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteGeometryDto {
    pub from: String,
    pub to: String,
    /// Points as `[latitude, longitude]`.
    #[schema(value_type = Vec<Vec<f64>>)]
    pub points: Vec<GeoPoint>,
    /// Encoded polyline string (Google format).
    pub polyline: String,
    pub point_count: usize,
    /// Great-circle distance between the two cities.
    pub straight_line_km: f64,
    /// Length of the returned geometry.
    pub route_length_km: f64,
}

impl RouteGeometryDto {
    pub fn new(from: &str, to: &str, points: Vec<GeoPoint>, straight_line_km: f64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            polyline: encode_polyline(&points),
            point_count: points.len(),
            route_length_km: polyline_length_km(&points),
            straight_line_km,
            points,
        }
    }
}

/// Road geometry for every hop of a shortest path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathGeometryDto {
    pub path: PathDto,
    /// Geometry of each hop that could be resolved.
    pub segments: Vec<RouteGeometryDto>,
    /// Hops with no geometry available, as `"from-to"`.
    pub unavailable: Vec<String>,
}

/// Error body returned by all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDto {
    /// Machine-readable kind: `NOT_FOUND`, `NO_PATH`, `ROUTE_UNAVAILABLE`, `INTERNAL`.
    pub error: String,
    pub message: String,
}
