//! REST API Server for the advisor chat
//!
//! Exposes the responder over HTTP; every chat route requires a bearer token

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Query, State,
    },
    http::{header, request::Parts, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::error::AdvisorError;
use crate::models::ChatExchange;
use crate::responder::ChatResponder;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Missing and `null` both read as an empty message
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            error: message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for AdvisorError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the log
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Error processing chat request.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

impl From<JsonRejection> for AdvisorError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected chat body: {}", rejection.body_text());
        AdvisorError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AdvisorError {
    fn from(rejection: QueryRejection) -> Self {
        warn!("Rejected query string: {}", rejection.body_text());
        AdvisorError::InvalidInput(format!("Invalid query: {}", rejection.body_text()))
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub responder: Arc<ChatResponder>,
    pub authenticator: Arc<dyn Authenticator>,
}

/// Authenticated caller, resolved by the configured `Authenticator`
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = AdvisorError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> std::result::Result<Self, Self::Rejection> {
        state.authenticator.authenticate(&parts.headers).map(AuthUser)
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoints
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    AuthUser(user_id): AuthUser,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatResponse>, AdvisorError> {
    let Json(req) = body?;
    let message = req.message.unwrap_or_default();
    info!(%user_id, "📨 Received chat message ({} chars)", message.len());

    let reply = state.responder.respond(user_id, &message).await?;

    Ok(Json(ChatResponse {
        response: reply.response,
    }))
}

async fn history_handler(
    State(state): State<ApiState>,
    AuthUser(user_id): AuthUser,
    query: std::result::Result<Query<HistoryQuery>, QueryRejection>,
) -> std::result::Result<Json<Vec<ChatExchange>>, AdvisorError> {
    let Query(query) = query?;
    let history = state.responder.history(user_id, query.limit).await?;
    info!(%user_id, "Returning {} chat exchanges", history.len());

    Ok(Json(history))
}

/// =============================
/// Router
/// =============================

/// CORS for a single browser origin, or anything when `*`
pub fn build_cors(allowed_origin: &str) -> crate::Result<CorsLayer> {
    if allowed_origin.trim() == "*" {
        return Ok(CorsLayer::permissive());
    }

    let origin = allowed_origin.parse::<HeaderValue>().map_err(|_| {
        AdvisorError::ConfigError(format!("Invalid CORS origin: {}", allowed_origin))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

pub fn create_router(state: ApiState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/history", get(history_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(state: ApiState, config: &ServerConfig) -> crate::Result<()> {
    let router = create_router(state, build_cors(&config.cors_allowed_origin)?);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!("🚀 API Server listening on http://0.0.0.0:{}", config.port);
    info!("📍 Local: http://127.0.0.1:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_cors_origins() {
        assert!(build_cors("*").is_ok());
        assert!(build_cors("http://localhost:3000").is_ok());
        assert!(matches!(
            build_cors("http://bad\norigin"),
            Err(AdvisorError::ConfigError(_))
        ));
    }

    #[test]
    fn test_server_errors_are_generic() {
        let response = AdvisorError::DatabaseError("password=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AdvisorError::InvalidInput("Message must not be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
