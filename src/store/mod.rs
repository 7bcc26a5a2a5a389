//! Chat exchange persistence
//!
//! Exchanges are append-only and read back newest-first per user.
//! In-memory for development; Postgres when a database URL is configured.

pub mod postgres;

use crate::config::DatabaseConfig;
use crate::models::ChatExchange;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

pub use postgres::PostgresChatStore;

/// Trait for chat exchange persistence
#[async_trait::async_trait]
pub trait ChatStore: Send + Sync {
    async fn save(&self, exchange: &ChatExchange) -> Result<()>;

    /// Newest first, at most `limit` entries when given
    async fn history(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<ChatExchange>>;
}

/// In-memory store for development and tests
pub struct InMemoryChatStore {
    exchanges_by_user: Arc<RwLock<HashMap<Uuid, Vec<ChatExchange>>>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self {
            exchanges_by_user: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChatStore for InMemoryChatStore {
    async fn save(&self, exchange: &ChatExchange) -> Result<()> {
        let mut exchanges = self.exchanges_by_user.write().await;
        exchanges
            .entry(exchange.user_id)
            .or_insert_with(Vec::new)
            .push(exchange.clone());
        Ok(())
    }

    async fn history(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<ChatExchange>> {
        let exchanges = self.exchanges_by_user.read().await;

        // Stored in insertion order, so reverse for newest-first; the stable
        // sort keeps that order for equal timestamps.
        let mut items: Vec<ChatExchange> = exchanges
            .get(&user_id)
            .map(|v| v.iter().rev().cloned().collect())
            .unwrap_or_default();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = limit {
            items.truncate(limit);
        }

        Ok(items)
    }
}

/// Pick the backend from configuration
pub fn build_store(config: &DatabaseConfig) -> Arc<dyn ChatStore> {
    if let Some(url) = config.url.as_deref() {
        match PostgresChatStore::connect_lazy(url, config.max_connections) {
            Ok(store) => {
                info!("Chat store backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres chat store, falling back to in-memory: {}",
                    error
                );
            }
        }
    }

    info!("Chat store backend: in-memory");
    Arc::new(InMemoryChatStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn exchange_at(user_id: Uuid, message: &str, minutes_ago: i64) -> ChatExchange {
        let mut exchange = ChatExchange::new(user_id, message.to_string(), format!("re: {}", message));
        exchange.created_at = Utc::now() - Duration::minutes(minutes_ago);
        exchange
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let store = InMemoryChatStore::new();
        let user = Uuid::new_v4();

        store.save(&exchange_at(user, "first", 30)).await.unwrap();
        store.save(&exchange_at(user, "second", 20)).await.unwrap();
        store.save(&exchange_at(user, "third", 10)).await.unwrap();

        let history = store.history(user, None).await.unwrap();
        let messages: Vec<_> = history.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_history_is_per_user() {
        let store = InMemoryChatStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.save(&exchange_at(alice, "alice asks", 1)).await.unwrap();
        store.save(&exchange_at(bob, "bob asks", 1)).await.unwrap();

        let history = store.history(alice, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_id, alice);
    }

    #[tokio::test]
    async fn test_history_limit() {
        let store = InMemoryChatStore::new();
        let user = Uuid::new_v4();
        for i in 0..5 {
            store.save(&exchange_at(user, &format!("q{}", i), 10 - i)).await.unwrap();
        }

        let history = store.history(user, Some(2)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "q4");
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let store = InMemoryChatStore::new();
        let history = tokio_test::block_on(store.history(Uuid::new_v4(), None)).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_build_store_without_url_is_in_memory() {
        let store = build_store(&DatabaseConfig {
            url: None,
            max_connections: 1,
        });
        let history = tokio_test::block_on(store.history(Uuid::new_v4(), None)).unwrap();
        assert!(history.is_empty());
    }
}
