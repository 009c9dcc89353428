//! Craftwise node binary.

use clap::Parser;
use craftwise_node::{init_tracing, run_server, Args};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Listen: {}", args.listen);
    info!(
        "Default max depth: {}",
        args.resolver_config()
            .default_max_depth
            .map_or_else(|| "unbounded".to_string(), |d| d.to_string())
    );
    info!("Max tree nodes: {}", args.max_tree_nodes);

    run_server(args).await
}
