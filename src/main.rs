//! City Graph - Axum Server

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use city_graph::api::{create_router, AppState};
use city_graph::config::AppConfig;
use city_graph::console;
use city_graph::demo_data;
use city_graph::routing::{DisabledResolver, OpenRouteServiceResolver, RouteResolver, RouteService};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("city_graph=info".parse().unwrap()))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    console::print_banner();

    let Some(graph) = demo_data::network_by_name(&config.network) else {
        error!("Unknown network {}", config.network);
        std::process::exit(2);
    };
    console::print_graph_summary(&config.network, &graph);

    let (resolver, routing_enabled): (Arc<dyn RouteResolver>, bool) = match &config.ors_api_key {
        Some(key) => match OpenRouteServiceResolver::new(key.clone(), config.ors_base_url.clone()) {
            Ok(resolver) => (Arc::new(resolver), true),
            Err(e) => {
                error!("OpenRouteService client unavailable, serving cached routes only: {}", e);
                (Arc::new(DisabledResolver), false)
            }
        },
        None => (Arc::new(DisabledResolver), false),
    };

    let routes = RouteService::open(resolver, config.route_cache.clone()).await;
    console::print_cache_status(routes.load_outcome(), routing_enabled);

    let app = create_router(Arc::new(AppState::new(config.network.clone(), graph, routes)));

    info!("Server listening on http://{}", config.bind);
    println!("Swagger UI at http://{}/q/swagger-ui", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
