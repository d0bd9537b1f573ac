use axum::middleware;
use axum_helpers::server::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use observability::{init_metrics, metrics_middleware};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);
    init_metrics()?;

    info!(
        collection = %config.collection_name,
        embedding = ?config.embedding,
        "Starting semantic documents API"
    );

    let state = AppState::new(config)?;

    // Build router with API routes (pass reference, not ownership!)
    let api_routes = api::routes(&state);

    // create_router adds docs/middleware; the console page and /metrics sit at the root
    let router = create_router::<openapi::ApiDoc>(api_routes, api::site(&state))?;

    // - /health: liveness check with app name/version
    // - /ready: readiness check with a vector store heartbeat
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()))
        .layer(middleware::from_fn(metrics_middleware));

    create_production_app(app, &state.config.server, async {
        // The store client holds no connections that need closing
        info!("Shutting down: nothing to release");
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Semantic documents API shutdown complete");
    Ok(())
}
