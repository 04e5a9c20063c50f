//! Colorful console output for server startup.

use owo_colors::OwoColorize;

use crate::algorithms::{minimum_spanning_tree, total_weight_km};
use crate::domain::Graph;
use crate::routing::CacheLoad;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
   ____ _ _               ____                 _
  / ___(_) |_ _   _      / ___|_ __ __ _ _ __ | |__
 | |   | | __| | | |____| |  _| '__/ _` | '_ \| '_ \
 | |___| | |_| |_| |____| |_| | | | (_| | |_) | | | |
  \____|_|\__|\__, |     \____|_|  \__,_| .__/|_| |_|
              |___/                     |_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "City Graph".bright_cyan()
    );
}

/// Prints node/edge counts and the spanning tree weight of the loaded graph.
pub fn print_graph_summary(name: &str, graph: &Graph) {
    let tree = minimum_spanning_tree(graph);
    let components = graph.node_count().saturating_sub(tree.len());
    println!(
        "{} {} {} Network {}: cities ({}), connections ({}), components ({}), spanning tree ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Graph]".bright_cyan(),
        name.white().bold(),
        graph.node_count().to_string().bright_yellow(),
        graph.edge_count().to_string().bright_yellow(),
        components.to_string().bright_yellow(),
        format_km(total_weight_km(graph, &tree)).bright_magenta()
    );
}

/// Prints the outcome of loading the route cache.
pub fn print_cache_status(load: &CacheLoad, routing_enabled: bool) {
    let status = match load {
        CacheLoad::Missing => "empty (no file)".white().to_string(),
        CacheLoad::Loaded(n) => format!("{} routes", n).bright_green().to_string(),
        CacheLoad::Corrupt(reason) => format!("discarded ({})", reason).bright_red().to_string(),
    };
    let resolver = if routing_enabled {
        "OpenRouteService".bright_green().to_string()
    } else {
        "disabled (cache only)".yellow().to_string()
    };
    println!(
        "{} {} {} Route cache: {}, resolver: {}",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Routes]".bright_cyan(),
        status,
        resolver
    );
}

/// Formats a distance in kilometers with two decimals.
fn format_km(km: f64) -> String {
    format!("{:.2} km", km)
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}
