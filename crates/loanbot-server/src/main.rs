mod configuration;
mod error;
mod routes;
mod state;

use anyhow::Context;
use loanbot::agent::Agent;
use loanbot::loan::LoanFacts;
use loanbot::providers::factory;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let facts = if settings.loan.lazy {
        LoanFacts::lazy(&settings.loan.path)
    } else {
        LoanFacts::eager(&settings.loan.path).with_context(|| {
            format!("Failed to load loan document {}", settings.loan.path.display())
        })?
    };

    tracing::info!(provider = %settings.provider.provider_type(), "creating provider");
    let provider = factory::get_provider(settings.provider.into_config())?;
    let mut agent =
        Agent::for_loan(provider, Arc::new(facts))?.with_policy(settings.agent.policy());
    if let Some(path) = &settings.agent.system_prompt {
        agent = agent.with_system_prompt_file(path)?;
    }

    // Create app state
    let state = state::AppState::new(Arc::new(agent));
    state.spawn_idle_sweeper(settings.server.session_idle(), settings.server.session_sweep());

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
