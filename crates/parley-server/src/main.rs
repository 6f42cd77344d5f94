mod configuration;
mod error;
mod routes;
mod state;

use parley::orchestrator::Orchestrator;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let config = settings.chat_config();

    // Build the registry, augmenter and directive once
    let orchestrator = Orchestrator::from_config(&config)?;
    for provider in &orchestrator.listing().providers {
        info!(
            provider = %provider.id,
            model = %provider.model,
            enabled = provider.enabled,
            "provider registered"
        );
    }
    info!(enabled = orchestrator.listing().context_enabled, "platform context");

    let state = state::AppState::new(orchestrator);

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    // Run server
    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
