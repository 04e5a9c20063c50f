//! REST API for the city graph.
//!
//! Provides endpoints for:
//! - Cities and connections of the loaded network
//! - BFS / DFS traversal order
//! - Shortest path and minimum spanning tree
//! - Cached road geometry between cities
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::algorithms::{bfs, dfs, minimum_spanning_tree, shortest_path, total_weight_km};
use crate::domain::{Graph, GraphError, NodeId};
use crate::dto::{
    CityDto, EdgeDto, ErrorDto, LegDto, PairQuery, PathDto, PathGeometryDto, RouteGeometryDto,
    SpanningTreeDto, TraversalDto,
};
use crate::routing::{route_key, RouteService, RoutingError};

/// Application state shared across handlers.
pub struct AppState {
    pub network: String,
    pub graph: Graph,
    pub routes: RouteService,
}

impl AppState {
    pub fn new(network: impl Into<String>, graph: Graph, routes: RouteService) -> Self {
        Self {
            network: network.into(),
            graph,
            routes,
        }
    }
}

/// API error with a distinct status per failure class.
#[derive(Debug)]
pub enum ApiError {
    Graph(GraphError),
    RouteUnavailable { from: String, to: String, cause: String },
    /// Local failure that is not the routing API's fault.
    Internal(String),
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        ApiError::Graph(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Graph(e @ GraphError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
            ApiError::Graph(e @ GraphError::NoPathFound { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_PATH", e.to_string())
            }
            ApiError::RouteUnavailable { from, to, cause } => (
                StatusCode::BAD_GATEWAY,
                "ROUTE_UNAVAILABLE",
                format!("No route geometry for {} -> {}: {}", from, to, cause),
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", message),
        };
        let body = ErrorDto {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Network
        .route("/cities", get(list_cities))
        .route("/edges", get(list_edges))
        // Algorithms
        .route("/traversal/bfs/{name}", get(traversal_bfs))
        .route("/traversal/dfs/{name}", get(traversal_dfs))
        .route("/shortest-path", get(get_shortest_path))
        .route("/shortest-path/geometry", get(get_shortest_path_geometry))
        .route("/mst", get(get_spanning_tree))
        // Road geometry
        .route("/routes", get(get_route))
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Status indicator ("UP" when healthy).
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// Application info response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    /// Name of the loaded network.
    pub network: String,
    pub city_count: usize,
    pub edge_count: usize,
    /// Routes currently held by the geometry cache.
    pub cached_routes: usize,
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "City Graph",
        version: env!("CARGO_PKG_VERSION"),
        network: state.network.clone(),
        city_count: state.graph.node_count(),
        edge_count: state.graph.edge_count(),
        cached_routes: state.routes.len(),
    })
}

// ============================================================================
// Network
// ============================================================================

/// GET /cities - All cities in insertion order.
#[utoipa::path(
    get,
    path = "/cities",
    responses((status = 200, description = "Cities", body = Vec<CityDto>))
)]
async fn list_cities(State(state): State<Arc<AppState>>) -> Json<Vec<CityDto>> {
    let graph = &state.graph;
    Json(graph.node_ids().filter_map(|id| CityDto::from_node(graph, id)).collect())
}

/// GET /edges - All connections in insertion order.
#[utoipa::path(
    get,
    path = "/edges",
    responses((status = 200, description = "Connections", body = Vec<EdgeDto>))
)]
async fn list_edges(State(state): State<Arc<AppState>>) -> Json<Vec<EdgeDto>> {
    let graph = &state.graph;
    Json(graph.edge_ids().filter_map(|id| EdgeDto::from_edge(graph, id)).collect())
}

// ============================================================================
// Algorithms
// ============================================================================

fn traversal_dto(graph: &Graph, algorithm: &str, start: NodeId, order: Vec<NodeId>) -> TraversalDto {
    TraversalDto {
        algorithm: algorithm.to_string(),
        start: graph.name_of(start).to_string(),
        order: order.into_iter().map(|id| graph.name_of(id).to_string()).collect(),
    }
}

/// GET /traversal/bfs/{name} - Breadth-first visit order.
#[utoipa::path(
    get,
    path = "/traversal/bfs/{name}",
    params(("name" = String, Path, description = "Start city name")),
    responses(
        (status = 200, description = "Visit order", body = TraversalDto),
        (status = 404, description = "Unknown city", body = ErrorDto)
    )
)]
async fn traversal_bfs(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TraversalDto>, ApiError> {
    let start = state.graph.require(&name)?;
    let order = bfs(&state.graph, start)?;
    Ok(Json(traversal_dto(&state.graph, "BFS", start, order)))
}

/// GET /traversal/dfs/{name} - Depth-first visit order.
#[utoipa::path(
    get,
    path = "/traversal/dfs/{name}",
    params(("name" = String, Path, description = "Start city name")),
    responses(
        (status = 200, description = "Visit order", body = TraversalDto),
        (status = 404, description = "Unknown city", body = ErrorDto)
    )
)]
async fn traversal_dfs(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<TraversalDto>, ApiError> {
    let start = state.graph.require(&name)?;
    let order = dfs(&state.graph, start)?;
    Ok(Json(traversal_dto(&state.graph, "DFS", start, order)))
}

/// GET /shortest-path?from=&to= - Dijkstra shortest path.
#[utoipa::path(
    get,
    path = "/shortest-path",
    params(PairQuery),
    responses(
        (status = 200, description = "Shortest path", body = PathDto),
        (status = 404, description = "Unknown city", body = ErrorDto),
        (status = 422, description = "Cities are not connected", body = ErrorDto)
    )
)]
async fn get_shortest_path(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PathDto>, ApiError> {
    let graph = &state.graph;
    let from = graph.require(&query.from)?;
    let to = graph.require(&query.to)?;
    let path = shortest_path(graph, from, to)?;
    info!(
        "Shortest path {} -> {}: {} cities, {:.2} km",
        query.from,
        query.to,
        path.nodes.len(),
        path.total_km
    );
    Ok(Json(PathDto::from_path(graph, &path)))
}

/// GET /shortest-path/geometry?from=&to= - Shortest path with road geometry per hop.
///
/// Hops whose geometry cannot be resolved are listed in `unavailable`; the
/// path itself is still returned.
#[utoipa::path(
    get,
    path = "/shortest-path/geometry",
    params(PairQuery),
    responses(
        (status = 200, description = "Path with geometry", body = PathGeometryDto),
        (status = 404, description = "Unknown city", body = ErrorDto),
        (status = 422, description = "Cities are not connected", body = ErrorDto)
    )
)]
async fn get_shortest_path_geometry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PairQuery>,
) -> Result<Json<PathGeometryDto>, ApiError> {
    let graph = &state.graph;
    let from = graph.require(&query.from)?;
    let to = graph.require(&query.to)?;
    let path = shortest_path(graph, from, to)?;

    let mut segments = Vec::new();
    let mut unavailable = Vec::new();
    for (a, b) in path.legs() {
        let (origin, destination) = (graph.node(a)?, graph.node(b)?);
        match state.routes.get_route(origin, destination).await {
            Some(points) => segments.push(RouteGeometryDto::new(
                origin.name(),
                destination.name(),
                points,
                state.routes.get_distance(origin, destination),
            )),
            None => unavailable.push(route_key(origin.name(), destination.name())),
        }
    }

    Ok(Json(PathGeometryDto {
        path: PathDto::from_path(graph, &path),
        segments,
        unavailable,
    }))
}

/// GET /mst - Kruskal minimum spanning tree.
#[utoipa::path(
    get,
    path = "/mst",
    responses((status = 200, description = "Minimum spanning tree", body = SpanningTreeDto))
)]
async fn get_spanning_tree(State(state): State<Arc<AppState>>) -> Json<SpanningTreeDto> {
    let graph = &state.graph;
    let tree = minimum_spanning_tree(graph);
    Json(SpanningTreeDto {
        total_km: total_weight_km(graph, &tree),
        spans_all_cities: tree.len() + 1 == graph.node_count(),
        edges: tree.into_iter().filter_map(|id| EdgeDto::from_edge(graph, id)).collect(),
    })
}

// ============================================================================
// Road geometry
// ============================================================================

/// GET /routes?from=&to= - Road geometry between two cities.
///
/// Served from the route cache when present; otherwise resolved once and
/// cached.
#[utoipa::path(
    get,
    path = "/routes",
    params(PairQuery),
    responses(
        (status = 200, description = "Route geometry", body = RouteGeometryDto),
        (status = 404, description = "Unknown city", body = ErrorDto),
        (status = 500, description = "Local failure", body = ErrorDto),
        (status = 502, description = "Geometry unavailable", body = ErrorDto)
    )
)]
async fn get_route(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PairQuery>,
) -> Result<Json<RouteGeometryDto>, ApiError> {
    let graph = &state.graph;
    let origin = graph.node(graph.require(&query.from)?)?;
    let destination = graph.node(graph.require(&query.to)?)?;

    match state.routes.try_get_route(origin, destination).await {
        Ok(points) => Ok(Json(RouteGeometryDto::new(
            origin.name(),
            destination.name(),
            points,
            state.routes.get_distance(origin, destination),
        ))),
        Err(e) => Err(route_error(origin.name(), destination.name(), e)),
    }
}

fn route_error(from: &str, to: &str, cause: RoutingError) -> ApiError {
    if cause.is_resolution_failure() {
        warn!("Route {} -> {} unavailable: {}", from, to, cause);
        ApiError::RouteUnavailable {
            from: from.to_string(),
            to: to.to_string(),
            cause: cause.to_string(),
        }
    } else {
        error!("Route {} -> {} failed locally: {}", from, to, cause);
        ApiError::Internal(cause.to_string())
    }
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        list_cities,
        list_edges,
        traversal_bfs,
        traversal_dfs,
        get_shortest_path,
        get_shortest_path_geometry,
        get_spanning_tree,
        get_route,
    ),
    components(schemas(
        HealthResponse,
        InfoResponse,
        CityDto,
        EdgeDto,
        TraversalDto,
        LegDto,
        PathDto,
        PathGeometryDto,
        SpanningTreeDto,
        RouteGeometryDto,
        ErrorDto,
    ))
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_data::el_salvador;
    use crate::domain::CityNode;
    use crate::geometry::GeoPoint;
    use crate::routing::{DisabledResolver, RouteResolver};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Resolver returning the straight segment between the two points.
    struct StraightLine;

    impl RouteResolver for StraightLine {
        fn resolve(&self, from: GeoPoint, to: GeoPoint) -> BoxFuture<'_, Result<Vec<GeoPoint>, RoutingError>> {
            async move { Ok(vec![from, to]) }.boxed()
        }
    }

    /// Resolver failing with a local I/O error.
    struct BrokenDisk;

    impl RouteResolver for BrokenDisk {
        fn resolve(&self, _from: GeoPoint, _to: GeoPoint) -> BoxFuture<'_, Result<Vec<GeoPoint>, RoutingError>> {
            async { Err(RoutingError::Io(std::io::Error::other("disk full"))) }.boxed()
        }
    }

    async fn app_with(graph: Graph, resolver: Arc<dyn RouteResolver>, dir: &TempDir) -> Router {
        let routes = RouteService::open(resolver, dir.path().join("rutas.json")).await;
        create_router(Arc::new(AppState::new("TEST", graph, routes)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn disconnected() -> Graph {
        let mut g = Graph::new();
        let a = g.add_node(CityNode::new("A", 0.0, 0.0));
        let b = g.add_node(CityNode::new("B", 0.0, 1.0));
        g.add_node(CityNode::new("Island", 5.0, 5.0));
        g.add_edge(a, b).unwrap();
        g
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let dir = TempDir::new().unwrap();
        let app = app_with(el_salvador(), Arc::new(StraightLine), &dir).await;

        let (status, body) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");

        let (_, body) = get_json(app, "/info").await;
        assert_eq!(body["cityCount"], 14);
        assert_eq!(body["edgeCount"], 22);
    }

    #[tokio::test]
    async fn test_traversals() {
        let dir = TempDir::new().unwrap();
        let app = app_with(el_salvador(), Arc::new(StraightLine), &dir).await;

        let (status, body) = get_json(app.clone(), "/traversal/bfs/San%20Salvador").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"].as_array().unwrap().len(), 14);
        assert_eq!(body["order"][0], "San Salvador");

        let (status, body) = get_json(app.clone(), "/traversal/dfs/santa%20ana").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["start"], "Santa Ana");

        let (status, body) = get_json(app, "/traversal/bfs/Gotham").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_shortest_path_errors_are_distinct() {
        let dir = TempDir::new().unwrap();
        let app = app_with(disconnected(), Arc::new(StraightLine), &dir).await;

        let (status, body) = get_json(app.clone(), "/shortest-path?from=A&to=B").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cities"], serde_json::json!(["A", "B"]));

        let (status, body) = get_json(app.clone(), "/shortest-path?from=A&to=Island").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "NO_PATH");

        let (status, body) = get_json(app, "/shortest-path?from=A&to=Nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_mst_reports_forest() {
        let dir = TempDir::new().unwrap();
        let app = app_with(disconnected(), Arc::new(StraightLine), &dir).await;
        let (_, body) = get_json(app, "/mst").await;
        assert_eq!(body["edges"].as_array().unwrap().len(), 1);
        assert_eq!(body["spansAllCities"], false);
    }

    #[tokio::test]
    async fn test_route_geometry() {
        let dir = TempDir::new().unwrap();
        let app = app_with(disconnected(), Arc::new(StraightLine), &dir).await;

        let (status, body) = get_json(app, "/routes?from=A&to=B").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pointCount"], 2);
        assert_eq!(body["points"][1], serde_json::json!([0.0, 1.0]));
        assert!(dir.path().join("rutas.json").exists());
    }

    #[tokio::test]
    async fn test_route_unavailable_is_bad_gateway() {
        let dir = TempDir::new().unwrap();
        let app = app_with(disconnected(), Arc::new(DisabledResolver), &dir).await;

        let (status, body) = get_json(app.clone(), "/routes?from=A&to=B").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "ROUTE_UNAVAILABLE");

        let (status, body) = get_json(app, "/shortest-path/geometry?from=A&to=B").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["segments"].as_array().unwrap().len(), 0);
        assert_eq!(body["unavailable"], serde_json::json!(["A-B"]));
    }

    #[tokio::test]
    async fn test_local_route_failure_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let app = app_with(disconnected(), Arc::new(BrokenDisk), &dir).await;

        let (status, body) = get_json(app, "/routes?from=A&to=B").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "INTERNAL");
    }

    #[tokio::test]
    async fn test_path_geometry_segments() {
        let dir = TempDir::new().unwrap();
        let app = app_with(el_salvador(), Arc::new(StraightLine), &dir).await;

        let (status, body) = get_json(app, "/shortest-path/geometry?from=Ahuachap%C3%A1n&to=La%20Uni%C3%B3n").await;
        assert_eq!(status, StatusCode::OK);
        let hops = body["path"]["legs"].as_array().unwrap().len();
        assert_eq!(body["segments"].as_array().unwrap().len(), hops);
        assert!(body["unavailable"].as_array().unwrap().is_empty());
    }
}
