//! City Graph
//!
//! Models a road network of cities as an undirected weighted graph and
//! answers questions about it over a small REST API.
//!
//! # Domain Model
//!
//! - [`CityNode`](domain::CityNode): Named city with latitude/longitude
//! - [`Edge`](domain::Edge): Undirected connection weighted by haversine distance
//! - [`Graph`](domain::Graph): Arena of cities and connections addressed by id
//!
//! # Algorithms
//!
//! - **Traversal**: BFS and DFS visit order from a start city
//! - **Shortest path**: Dijkstra over straight-line edge weights
//! - **Spanning tree**: Kruskal with a [`DisjointSet`](union_find::DisjointSet)
//!
//! # Road Geometry
//!
//! [`RouteService`](routing::RouteService) returns road polylines between
//! cities, caching them in memory and in a JSON file.

pub mod algorithms;
pub mod api;
pub mod config;
pub mod console;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod geometry;
pub mod routing;
pub mod union_find;
