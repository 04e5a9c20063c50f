//! Domain model for the city graph.
//!
//! # Overview
//!
//! - [`CityNode`]: named location with coordinates
//! - [`Edge`]: undirected connection weighted by haversine distance
//! - [`Graph`]: arena of nodes and edges addressed by [`NodeId`] / [`EdgeId`]
//!
//! # Design
//!
//! Nodes live in a `petgraph` [`UnGraph`] and are never copied into edges or
//! algorithm state; everything downstream refers to them by handle. The graph
//! is built once and read many times, so there are no removal operations and
//! handles stay valid.
//!
//! Traversals do not use petgraph's own neighbor iteration, which yields the
//! most recently added edge first. [`Graph::neighbors`] walks the edge list in
//! index order instead, so visit order follows insertion order.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::fmt;

use crate::geometry::{haversine_km, GeoPoint};

/// Error type for graph lookups and path queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A referenced node name or handle does not exist in the graph.
    NotFound(String),
    /// Both nodes exist but lie in different components.
    NoPathFound { from: String, to: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NotFound(name) => write!(f, "Node not found: {}", name),
            GraphError::NoPathFound { from, to } => write!(f, "No path from {} to {}", from, to),
        }
    }
}

impl std::error::Error for GraphError {}

/// Handle to a node in a [`Graph`].
pub type NodeId = NodeIndex;

/// Handle to an edge in a [`Graph`].
pub type EdgeId = EdgeIndex;

/// A city with its name and geographic position.
///
/// # Examples
///
/// ```
/// use city_graph::domain::CityNode;
///
/// let a = CityNode::new("A", 0.0, 0.0);
/// let b = CityNode::new("B", 0.0, 1.0);
/// assert!((a.distance_km(&b) - 111.19).abs() < 0.01);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CityNode {
    name: String,
    latitude: f64,
    longitude: f64,
}

impl CityNode {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Straight-line distance to another city in kilometers.
    pub fn distance_km(&self, other: &CityNode) -> f64 {
        haversine_km(self.point(), other.point())
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name
            .chars()
            .flat_map(char::to_lowercase)
            .eq(name.chars().flat_map(char::to_lowercase))
    }
}

/// Undirected edge between two nodes.
///
/// `from`/`to` only record the order the edge was added in; every query
/// treats `(a, b)` and `(b, a)` the same. This is a copy read out of the
/// graph, not a way to build one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Haversine distance between the endpoints, computed at construction.
    pub weight_km: f64,
}

impl Edge {
    /// Returns true if `node` is either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }

    /// Returns the endpoint opposite to `node`, or `None` if not incident.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }

    /// Returns true if this edge joins `a` and `b` in either order.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Weighted undirected graph of cities.
///
/// Only [`Graph::add_node`] and [`Graph::add_edge`] put data in, so every
/// edge endpoint is a node of this graph.
///
/// # Examples
///
/// ```
/// use city_graph::domain::{CityNode, Graph};
///
/// let mut graph = Graph::new();
/// let a = graph.add_node(CityNode::new("A", 0.0, 0.0));
/// let b = graph.add_node(CityNode::new("B", 0.0, 1.0));
/// graph.add_edge(a, b).unwrap();
///
/// assert_eq!(graph.find_by_name("a"), Some(a));
/// assert!(graph.has_edge_between(b, a));
/// assert_eq!(graph.neighbors(a)[0].0, b);
/// ```
///
/// There is no deserializer that could bypass `add_edge`:
///
/// ```compile_fail
/// use city_graph::domain::Graph;
///
/// let graph: Graph = serde_json::from_str(r#"{"nodes": [], "edges": []}"#).unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Graph {
    inner: UnGraph<CityNode, f64>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node. Names are not checked for uniqueness.
    pub fn add_node(&mut self, node: CityNode) -> NodeId {
        self.inner.add_node(node)
    }

    /// Appends an edge weighted by the haversine distance of its endpoints.
    ///
    /// Parallel edges are accepted; use [`Graph::has_edge_between`] first to
    /// avoid them. Fails if either handle is not part of this graph.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, GraphError> {
        let weight_km = self.node(a)?.distance_km(self.node(b)?);
        Ok(self.inner.add_edge(a, b, weight_km))
    }

    /// Returns true if any edge joins `a` and `b`, in either order.
    pub fn has_edge_between(&self, a: NodeId, b: NodeId) -> bool {
        self.edges().any(|e| e.connects(a, b))
    }

    /// Case-insensitive lookup returning the first matching node.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.inner
            .node_indices()
            .find(|&id| self.inner[id].is_named(name))
    }

    /// Like [`Graph::find_by_name`] but fails with [`GraphError::NotFound`].
    pub fn require(&self, name: &str) -> Result<NodeId, GraphError> {
        self.find_by_name(name)
            .ok_or_else(|| GraphError::NotFound(name.to_string()))
    }

    pub fn node(&self, id: NodeId) -> Result<&CityNode, GraphError> {
        self.inner
            .node_weight(id)
            .ok_or_else(|| GraphError::NotFound(format!("#{}", id.index())))
    }

    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        let (from, to) = self.inner.edge_endpoints(id)?;
        let weight_km = *self.inner.edge_weight(id)?;
        Some(Edge { from, to, weight_km })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.node_weight(id).is_some()
    }

    /// Display name of a node; empty for unknown handles.
    pub fn name_of(&self, id: NodeId) -> &str {
        self.inner.node_weight(id).map(CityNode::name).unwrap_or("")
    }

    /// Nodes adjacent to `id` with the connecting edge weight.
    ///
    /// Follows edge insertion order and repeats a neighbor once per parallel
    /// edge.
    pub fn neighbors(&self, id: NodeId) -> Vec<(NodeId, f64)> {
        self.edges()
            .filter_map(|e| e.other(id).map(|n| (n, e.weight_km)))
            .collect()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &CityNode> + '_ {
        self.inner.node_indices().map(move |id| &self.inner[id])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.inner.edge_references().map(|e| Edge {
            from: e.source(),
            to: e.target(),
            weight_km: *e.weight(),
        })
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.inner.node_indices()
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        self.inner.edge_indices()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}
