//! Financial data providers
//!
//! One provider per topic. A provider failure never reaches the caller:
//! `fetch_or_fallback` swaps any error for the provider's fallback text.

pub mod http;

use crate::config::ProviderConfig;
use crate::models::Topic;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub use http::{EndpointProvider, ProviderHttpClient};

/// Trait for a single data source
#[async_trait::async_trait]
pub trait DataProvider: Send + Sync {
    fn topic(&self) -> Topic;

    /// Text used in place of data when `fetch` fails
    fn fallback(&self) -> &str;

    async fn fetch(&self) -> Result<Value>;
}

/// Run a provider, absorbing failures into its fallback text
pub async fn fetch_or_fallback(provider: &dyn DataProvider) -> Value {
    match provider.fetch().await {
        Ok(payload) => {
            info!(topic = ?provider.topic(), "Provider fetch succeeded");
            payload
        }
        Err(e) => {
            warn!(topic = ?provider.topic(), "Provider fetch failed, using fallback: {}", e);
            Value::String(provider.fallback().to_string())
        }
    }
}

/// Render a payload for the response body. Strings go in as-is, anything
/// else as compact JSON.
pub fn render_payload(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Provider registry keyed by topic
pub struct ProviderRegistry {
    providers: HashMap<Topic, Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider, replacing any previous one for the same topic
    pub fn register(&mut self, provider: Arc<dyn DataProvider>) {
        self.providers.insert(provider.topic(), provider);
    }

    pub fn get(&self, topic: Topic) -> Option<Arc<dyn DataProvider>> {
        self.providers.get(&topic).cloned()
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.providers.keys().copied().collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry with the four HTTP providers
pub fn create_default_registry(config: &ProviderConfig) -> Result<ProviderRegistry> {
    let http = ProviderHttpClient::new(config.timeout_seconds)?;
    let mut registry = ProviderRegistry::new();

    registry.register(Arc::new(EndpointProvider::currency(http.clone(), config)));
    registry.register(Arc::new(EndpointProvider::stock_gainers(http.clone(), config)));
    registry.register(Arc::new(EndpointProvider::economic_calendar(http.clone(), config)));
    registry.register(Arc::new(EndpointProvider::metal_prices(http, config)));

    Ok(registry)
}
