mod auth;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;
mod tailor;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AccessKeyValidator;
use crate::config::Config;
use crate::llm_client::VertexClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on a malformed PORT)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Tailor v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the Vertex client once; handlers share it through AppState
    let vertex = VertexClient::from_config(&config).await?;
    info!(
        "Vertex client initialized (project: {}, location: {}, model: {})",
        config.vertex_project,
        config.vertex_location,
        vertex.model()
    );

    if config.access_key.is_none() {
        warn!("CVTAILOR_ACCESS_KEY is not set; the tailoring endpoint is open to all callers");
    }

    let state = AppState {
        config: config.clone(),
        generator: Arc::new(vertex),
        validator: Arc::new(AccessKeyValidator::new(config.access_key.clone())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
