use financial_advisor_chat::{
    api::{start_server, ApiState},
    auth::BearerTokenAuthenticator,
    config::AppConfig,
    providers::create_default_registry,
    responder::ChatResponder,
    store::build_store,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (.env + environment)
    let config = AppConfig::from_env()?;

    info!("🚀 Financial Advisor Chat - API Server");
    info!("📍 Port: {}", config.server.port);

    // Create components
    let registry = create_default_registry(&config.providers)?;
    let store = build_store(&config.database);
    let responder = ChatResponder::new(registry, store)
        .with_faq_persistence(config.chat.persist_faq_hits);

    let state = ApiState {
        responder: Arc::new(responder),
        authenticator: Arc::new(BearerTokenAuthenticator),
    };

    info!("✅ Responder initialized");
    info!("🌐 Starting API server...");

    start_server(state, &config.server).await?;

    Ok(())
}
