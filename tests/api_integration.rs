use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use financial_advisor_chat::{
    api::{build_cors, create_router, ApiState},
    auth::{user_id_from_token, BearerTokenAuthenticator},
    config::ProviderConfig,
    error::AdvisorError,
    knowledge::TipBook,
    models::{ChatExchange, Topic},
    providers::{create_default_registry, DataProvider, ProviderRegistry},
    responder::ChatResponder,
    store::{ChatStore, InMemoryChatStore},
    Result,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct MetalsStub;

#[async_trait::async_trait]
impl DataProvider for MetalsStub {
    fn topic(&self) -> Topic {
        Topic::MetalPrices
    }

    fn fallback(&self) -> &str {
        "Unable to fetch metal prices."
    }

    async fn fetch(&self) -> Result<Value> {
        Ok(json!({"price": 1900}))
    }
}

struct DownStore;

#[async_trait::async_trait]
impl ChatStore for DownStore {
    async fn save(&self, _exchange: &ChatExchange) -> Result<()> {
        Err(AdvisorError::DatabaseError("connection refused".to_string()))
    }

    async fn history(&self, _user_id: Uuid, _limit: Option<usize>) -> Result<Vec<ChatExchange>> {
        Err(AdvisorError::DatabaseError("connection refused".to_string()))
    }
}

fn app_with(registry: ProviderRegistry, store: Arc<dyn ChatStore>) -> Router {
    let responder = ChatResponder::new(registry, store)
        .with_tips(TipBook::with_rng(Box::new(StdRng::seed_from_u64(5))));

    let state = ApiState {
        responder: Arc::new(responder),
        authenticator: Arc::new(BearerTokenAuthenticator),
    };

    create_router(state, build_cors("*").unwrap())
}

fn stub_app(store: Arc<dyn ChatStore>) -> Router {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MetalsStub));
    app_with(registry, store)
}

fn chat_request(token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn history_request(token: &str, query: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/api/chat/history{}", query))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_gold_question_round_trip() {
    let store = Arc::new(InMemoryChatStore::new());
    let app = stub_app(store.clone());

    let response = app
        .clone()
        .oneshot(chat_request(
            Some("alice"),
            json!({"message": "What's the gold price today?"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = json_body(response).await["response"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(text.contains("Sentiment Analysis: Neutral"));
    assert!(text.contains(r#"{"price":1900}"#));
    assert!(text.contains("Financial Tip: "));

    let response = app.oneshot(history_request("alice", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let history = json_body(response).await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["message"], "What's the gold price today?");
    assert_eq!(entries[0]["response"], text.as_str());
    assert_eq!(
        entries[0]["user_id"],
        user_id_from_token("alice").to_string()
    );
}

#[tokio::test]
async fn test_faq_leaves_history_untouched() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));

    let response = app
        .clone()
        .oneshot(chat_request(Some("bob"), json!({"message": "how to save money"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["response"],
        "Save at least 20% of your income each month and avoid impulse purchases."
    );

    let response = app.oneshot(history_request("bob", "")).await.unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_unreachable_provider_still_ok() {
    let config = ProviderConfig {
        alpha_vantage_api_key: "demo".into(),
        finnhub_api_key: "demo".into(),
        alpha_vantage_base_url: "http://127.0.0.1:9".into(),
        finnhub_base_url: "http://127.0.0.1:9".into(),
        currency_from: "USD".into(),
        currency_to: "EUR".into(),
        timeout_seconds: 2,
    };
    let app = app_with(
        create_default_registry(&config).unwrap(),
        Arc::new(InMemoryChatStore::new()),
    );

    let response = app
        .oneshot(chat_request(
            Some("carol"),
            json!({"message": "show me the stock market gainers"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["response"]
        .as_str()
        .unwrap()
        .contains("Financial Data: Unable to fetch stock gainers."));
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));
    let response = app
        .oneshot(chat_request(None, json!({"message": "gold"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_empty_message_is_400() {
    let store = Arc::new(InMemoryChatStore::new());
    let app = stub_app(store.clone());

    for body in [json!({"message": ""}), json!({"message": "  "}), json!({})] {
        let response = app
            .clone()
            .oneshot(chat_request(Some("dave"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let history = store
        .history(user_id_from_token("dave"), None)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_malformed_chat_body_is_400() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));

    for body in [json!({"message": null}), json!({"message": 42}), json!("gold")] {
        let response = app
            .clone()
            .oneshot(chat_request(Some("henry"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert!(body["timestamp"].is_string());
    }

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer henry")
        .body(Body::from("message=gold"))
        .unwrap();
    let response = app.clone().oneshot(not_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::AUTHORIZATION, "Bearer henry")
        .body(Body::from(json!({"message": "gold"}).to_string()))
        .unwrap();
    let response = app.oneshot(no_content_type).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_bad_history_limit_is_400() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));

    let response = app
        .oneshot(history_request("ivy", "?limit=lots"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_store_failure_is_500() {
    let app = stub_app(Arc::new(DownStore));

    let response = app
        .clone()
        .oneshot(chat_request(Some("erin"), json!({"message": "silver?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = app.oneshot(history_request("erin", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_history_is_scoped_and_limited() {
    let app = stub_app(Arc::new(InMemoryChatStore::new()));

    for message in ["first question", "second question", "third question"] {
        let response = app
            .clone()
            .oneshot(chat_request(Some("frank"), json!({ "message": message })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    app.clone()
        .oneshot(chat_request(Some("grace"), json!({"message": "grace's question"})))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(history_request("frank", "?limit=2"))
        .await
        .unwrap();
    let history = json_body(response).await;
    let messages: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["third question", "second question"]);

    let response = app.oneshot(history_request("grace", "")).await.unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}
