use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wayfarer::agent::Agent;
use wayfarer::capabilities::{OpenMeteoClient, OpenMeteoConfig};
use wayfarer::providers::factory;
use wayfarer::registry::CapabilityRegistry;

mod configuration;
mod error;
mod routes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let provider_type = settings.provider.provider_type();
    let provider = factory::get_provider(settings.provider.into_config())?;
    let client = OpenMeteoClient::new(OpenMeteoConfig::default())?;
    let agent = Agent::new(
        provider,
        CapabilityRegistry::with_travel_capabilities(client),
        settings.agent.into_config(),
    );
    info!(
        provider = %provider_type,
        max_turns = agent.config().max_turns,
        "Agent ready"
    );

    let state = state::AppState::new(agent);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
