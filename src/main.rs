// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::advisory_client::AdvisoryClient;
use crate::application::advisory_service::AdvisoryService;
use crate::application::session_controller::SessionController;
use crate::application::simulator::Simulator;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::gemini_advisory::GeminiAdvisory;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // Advisory transport (infrastructure layer), absent without a credential
    let advisory_service: Option<Arc<dyn AdvisoryService>> =
        app_config.advisory.credential().map(|key| {
            Arc::new(GeminiAdvisory::new(
                app_config.advisory.endpoint.clone(),
                app_config.advisory.model.clone(),
                key.to_string(),
            )) as Arc<dyn AdvisoryService>
        });

    // Create services (application layer)
    let advisory = AdvisoryClient::new(
        advisory_service,
        app_config.advisory.timeout(),
        app_config.advisory.offline_delay(),
    );
    if !advisory.is_configured() {
        tracing::warn!("No advisory API key configured, analysis will use the fallback result");
    }

    let controller = Arc::new(SessionController::new(
        Simulator::new(app_config.simulation.simulator_settings()),
        advisory,
        app_config.simulation.history_seed(),
        app_config.boot.delay_scale,
    ));

    // Create application state
    let state = Arc::new(AppState { controller });

    // Build router (presentation layer)
    let router = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", app_config.server.host, app_config.server.port).parse()?;
    tracing::info!("Starting indoor-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
