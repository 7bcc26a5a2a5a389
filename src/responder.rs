//! Message Classifier & Responder
//!
//! FAQ → SENTIMENT → TOPIC → FETCH → TIP → COMPOSE → PERSIST
//!
//! FAQ hits short-circuit everything else. Every other message gets a
//! three-line reply (sentiment, data, tip) that is persisted before it is
//! returned.

use crate::classifier::TopicClassifier;
use crate::error::AdvisorError;
use crate::knowledge::{FaqTable, TipBook};
use crate::models::{ChatExchange, ChatReply, Topic};
use crate::providers::{fetch_or_fallback, render_payload, ProviderRegistry};
use crate::sentiment::SentimentAnalyzer;
use crate::store::ChatStore;
use crate::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const SENTIMENT_PREFIX: &str = "Sentiment Analysis: ";
pub const DATA_PREFIX: &str = "Financial Data: ";
pub const TIP_PREFIX: &str = "Financial Tip: ";
pub const NO_RELEVANT_DATA: &str = "No relevant financial data found.";

pub struct ChatResponder {
    faqs: FaqTable,
    tips: TipBook,
    sentiment: SentimentAnalyzer,
    providers: ProviderRegistry,
    store: Arc<dyn ChatStore>,
    persist_faq_hits: bool,
}

impl ChatResponder {
    pub fn new(providers: ProviderRegistry, store: Arc<dyn ChatStore>) -> Self {
        Self {
            faqs: FaqTable::default(),
            tips: TipBook::default(),
            sentiment: SentimentAnalyzer::new(),
            providers,
            store,
            persist_faq_hits: false,
        }
    }

    pub fn with_faqs(mut self, faqs: FaqTable) -> Self {
        self.faqs = faqs;
        self
    }

    pub fn with_tips(mut self, tips: TipBook) -> Self {
        self.tips = tips;
        self
    }

    /// Also record FAQ answers in history
    pub fn with_faq_persistence(mut self, persist: bool) -> Self {
        self.persist_faq_hits = persist;
        self
    }

    /// Answer one message for an authenticated user
    pub async fn respond(&self, user_id: Uuid, message: &str) -> Result<ChatReply> {
        if message.trim().is_empty() {
            return Err(AdvisorError::InvalidInput(
                "Message must not be empty".to_string(),
            ));
        }

        if let Some(answer) = self.faqs.lookup(message) {
            info!(%user_id, "FAQ hit");
            let response = answer.to_string();

            if self.persist_faq_hits {
                self.persist(user_id, message, &response).await?;
            }

            return Ok(ChatReply {
                response,
                sentiment: None,
                topic: None,
                faq_hit: true,
            });
        }

        let sentiment = self.sentiment.analyze(message);
        let topic = TopicClassifier::classify(message);
        info!(
            %user_id,
            score = sentiment.score,
            comparative = sentiment.comparative,
            label = %sentiment.label,
            topic = ?topic,
            "Composing chat response"
        );

        let data = self.fetch_data(topic).await;
        let tip = self.tips.pick();

        let response = format!(
            "{}{}\n{}{}\n{}{}",
            SENTIMENT_PREFIX, sentiment.label, DATA_PREFIX, data, TIP_PREFIX, tip
        );

        self.persist(user_id, message, &response).await?;

        Ok(ChatReply {
            response,
            sentiment: Some(sentiment.label),
            topic,
            faq_hit: false,
        })
    }

    /// Newest-first exchanges for a user
    pub async fn history(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<ChatExchange>> {
        self.store.history(user_id, limit).await
    }

    async fn fetch_data(&self, topic: Option<Topic>) -> String {
        let Some(topic) = topic else {
            return NO_RELEVANT_DATA.to_string();
        };

        match self.providers.get(topic) {
            Some(provider) => {
                info!(%topic, "Fetching financial data");
                render_payload(&fetch_or_fallback(provider.as_ref()).await)
            }
            None => {
                warn!(%topic, "No provider registered for topic");
                NO_RELEVANT_DATA.to_string()
            }
        }
    }

    async fn persist(&self, user_id: Uuid, message: &str, response: &str) -> Result<()> {
        let exchange = ChatExchange::new(user_id, message.to_string(), response.to_string());

        self.store.save(&exchange).await.map_err(|e| {
            error!(%user_id, "Chat exchange could not be saved: {}", e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use crate::providers::DataProvider;
    use crate::store::InMemoryChatStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};

    struct StaticProvider {
        topic: Topic,
        payload: Value,
    }

    #[async_trait::async_trait]
    impl DataProvider for StaticProvider {
        fn topic(&self) -> Topic {
            self.topic
        }

        fn fallback(&self) -> &str {
            "Unable to fetch data."
        }

        async fn fetch(&self) -> Result<Value> {
            Ok(self.payload.clone())
        }
    }

    struct BrokenProvider(Topic);

    #[async_trait::async_trait]
    impl DataProvider for BrokenProvider {
        fn topic(&self) -> Topic {
            self.0
        }

        fn fallback(&self) -> &str {
            "Unable to fetch data."
        }

        async fn fetch(&self) -> Result<Value> {
            Err(AdvisorError::ProviderError("timed out".to_string()))
        }
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl ChatStore for FailingStore {
        async fn save(&self, _exchange: &ChatExchange) -> Result<()> {
            Err(AdvisorError::DatabaseError("write refused".to_string()))
        }

        async fn history(&self, _user_id: Uuid, _limit: Option<usize>) -> Result<Vec<ChatExchange>> {
            Ok(vec![])
        }
    }

    fn registry_with_all_topics() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (topic, payload) in [
            (Topic::Currency, json!({"rate": "0.92"})),
            (Topic::StockGainers, json!([{"symbol": "NVDA"}])),
            (Topic::EconomicEvents, json!([{"event": "CPI"}])),
            (Topic::MetalPrices, json!({"price": 1900})),
        ] {
            registry.register(Arc::new(StaticProvider { topic, payload }));
        }
        registry
    }

    fn responder(store: Arc<dyn ChatStore>) -> ChatResponder {
        ChatResponder::new(registry_with_all_topics(), store)
            .with_tips(TipBook::with_rng(Box::new(StdRng::seed_from_u64(11))))
    }

    #[tokio::test]
    async fn test_faq_hit_is_verbatim_and_not_persisted() {
        let store = Arc::new(InMemoryChatStore::new());
        let responder = responder(store.clone());
        let user = Uuid::new_v4();

        let reply = responder.respond(user, "How to save money").await.unwrap();

        assert!(reply.faq_hit);
        assert_eq!(
            reply.response,
            "Save at least 20% of your income each month and avoid impulse purchases."
        );
        assert!(!reply.response.contains(SENTIMENT_PREFIX));
        assert!(!reply.response.contains(TIP_PREFIX));
        assert!(store.history(user, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_faq_hit_persisted_when_enabled() {
        let store = Arc::new(InMemoryChatStore::new());
        let responder = responder(store.clone()).with_faq_persistence(true);
        let user = Uuid::new_v4();

        responder.respond(user, "best way to invest").await.unwrap();

        assert_eq!(store.history(user, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gold_question_composes_three_lines() {
        let store = Arc::new(InMemoryChatStore::new());
        let responder = responder(store.clone());
        let user = Uuid::new_v4();

        let reply = responder
            .respond(user, "What's the gold price today?")
            .await
            .unwrap();

        let lines: Vec<&str> = reply.response.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Sentiment Analysis: Neutral");
        assert_eq!(lines[1], r#"Financial Data: {"price":1900}"#);
        assert!(lines[2].starts_with(TIP_PREFIX));
        let tip = &lines[2][TIP_PREFIX.len()..];
        assert!(TipBook::default().tips().iter().any(|t| t == tip));

        let history = store.history(user, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "What's the gold price today?");
        assert_eq!(history[0].response, reply.response);
    }

    #[tokio::test]
    async fn test_sentiment_label_matches_sign() {
        let responder = responder(Arc::new(InMemoryChatStore::new()));
        let user = Uuid::new_v4();

        let cases = [
            ("I love my great profits", SentimentLabel::Positive),
            ("I'm worried about losses", SentimentLabel::Negative),
            ("tell me about bonds", SentimentLabel::Neutral),
        ];

        for (message, expected) in cases {
            let reply = responder.respond(user, message).await.unwrap();
            assert_eq!(reply.sentiment, Some(expected));

            let labels = ["Positive", "Negative", "Neutral"];
            let first = reply.response.lines().next().unwrap();
            assert_eq!(
                labels.iter().filter(|l| first.ends_with(*l)).count(),
                1
            );
        }
    }

    #[tokio::test]
    async fn test_currency_wins_over_stock() {
        let responder = responder(Arc::new(InMemoryChatStore::new()));
        let reply = responder
            .respond(Uuid::new_v4(), "stock or currency, which is safer?")
            .await
            .unwrap();

        assert_eq!(reply.topic, Some(Topic::Currency));
        assert!(reply.response.contains(r#"{"rate":"0.92"}"#));
    }

    #[tokio::test]
    async fn test_no_topic_uses_placeholder() {
        let responder = responder(Arc::new(InMemoryChatStore::new()));
        let reply = responder.respond(Uuid::new_v4(), "hello").await.unwrap();

        assert_eq!(reply.topic, None);
        assert!(reply
            .response
            .contains(&format!("{}{}", DATA_PREFIX, NO_RELEVANT_DATA)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_absorbed() {
        let store = Arc::new(InMemoryChatStore::new());
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(BrokenProvider(Topic::EconomicEvents)));
        let responder = ChatResponder::new(registry, store.clone());
        let user = Uuid::new_v4();

        let reply = responder.respond(user, "is inflation coming?").await.unwrap();

        assert!(reply.response.contains("Financial Data: Unable to fetch data."));
        assert_eq!(store.history(user, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = Arc::new(InMemoryChatStore::new());
        let responder = responder(store.clone());
        let user = Uuid::new_v4();

        let result = responder.respond(user, "   ").await;
        assert!(matches!(result, Err(AdvisorError::InvalidInput(_))));
        assert!(store.history(user, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let responder = responder(Arc::new(FailingStore));
        let result = responder.respond(Uuid::new_v4(), "gold").await;
        assert!(matches!(result, Err(AdvisorError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn test_seeded_tips_repeat() {
        let first = responder(Arc::new(InMemoryChatStore::new()))
            .respond(Uuid::new_v4(), "hello")
            .await
            .unwrap();
        let second = responder(Arc::new(InMemoryChatStore::new()))
            .respond(Uuid::new_v4(), "hello")
            .await
            .unwrap();

        assert_eq!(first.response, second.response);
    }
}
