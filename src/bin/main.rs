use financial_advisor_chat::{
    auth::user_id_from_token,
    config::AppConfig,
    providers::create_default_registry,
    responder::ChatResponder,
    store::InMemoryChatStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One-shot chat: `advisor <message...>`, answered with live providers and
/// an in-memory store.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if message.trim().is_empty() {
        eprintln!("usage: advisor <message>");
        std::process::exit(2);
    }

    let config = AppConfig::from_env()?;
    let registry = create_default_registry(&config.providers)?;
    let responder = ChatResponder::new(registry, Arc::new(InMemoryChatStore::new()));

    let user_id = user_id_from_token("local-cli");
    info!(%user_id, message = %message, "Running advisor");

    match responder.respond(user_id, &message).await {
        Ok(reply) => {
            println!("{}", reply.response);
            Ok(())
        }
        Err(e) => {
            eprintln!("Advisor failed: {}", e);
            Err(Box::new(e) as Box<dyn std::error::Error>)
        }
    }
}
