//! # Craftwise Node
//!
//! HTTP and WebSocket service for recipe resolution and crafting progress.

use axum::{
    routing::{get, put},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;
pub mod state;

pub use config::{Args, ConfigError};
pub use service::ProgressService;
pub use state::AppState;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("craftwise={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the Craftwise node server.
pub async fn run_server(args: Args) -> anyhow::Result<()> {
    info!("🚀 Craftwise node starting...");

    let recipes = args.seed_recipes()?;
    if !recipes.is_empty() {
        info!("🌱 Seeded {} recipes", recipes.len());
    }
    let state = AppState::seeded(recipes, args.resolver_config())?;

    let app = create_router(state, args.cors_permissive);

    info!("🌐 Listening on http://{}", args.listen);

    let listener = TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
pub fn create_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Recipe API
        .route(
            "/recipes",
            get(api::recipes::list_recipes).post(api::recipes::create_recipe),
        )
        .route("/recipes/search", get(api::recipes::search))
        .route(
            "/recipes/:id",
            get(api::recipes::get_recipe)
                .put(api::recipes::update_recipe)
                .delete(api::recipes::delete_recipe),
        )
        .route("/recipes/:id/calculate", get(api::recipes::calculate))

        // Project API
        .route(
            "/projects",
            get(api::projects::list_projects).post(api::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(api::projects::get_project).delete(api::projects::delete_project),
        )
        .route("/projects/:id/progress", get(api::projects::get_progress))
        .route("/projects/:id/nodes", put(api::projects::update_node))
        .route(
            "/projects/:id/nodes/required",
            put(api::projects::update_node_required),
        )
        .route(
            "/projects/:id/items/:item_id",
            put(api::projects::update_item),
        )

        // WebSocket endpoints
        .route("/ws/projects/:id/progress", get(api::ws::progress_stream))
        .with_state(state);

    let router = if cors_permissive {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    };

    router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
