//! Service configuration
//!
//! Built once at startup and handed to constructors. Nothing below the
//! binaries reads the process environment.

use crate::error::AdvisorError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub providers: ProviderConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// `*` allows any origin
    pub cors_allowed_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub alpha_vantage_api_key: String,
    pub finnhub_api_key: String,
    pub alpha_vantage_base_url: String,
    pub finnhub_base_url: String,
    pub currency_from: String,
    pub currency_to: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Record FAQ answers in history too
    pub persist_faq_hits: bool,
}

impl AppConfig {
    /// Load from `.env` and the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, falling back to defaults for missing keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.server.port,
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(raw) => parse_value("DB_MAX_CONNECTIONS", &raw)?,
            None => defaults.database.max_connections,
        };

        let timeout_seconds = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => parse_value("PROVIDER_TIMEOUT_SECS", &raw)?,
            None => defaults.providers.timeout_seconds,
        };

        let persist_faq_hits = match get("PERSIST_FAQ_HITS") {
            Some(raw) => parse_value("PERSIST_FAQ_HITS", &raw.to_lowercase())?,
            None => defaults.chat.persist_faq_hits,
        };

        let alpha_vantage_api_key = get("ALPHA_VANTAGE_API_KEY").unwrap_or_default();
        if alpha_vantage_api_key.is_empty() {
            warn!("ALPHA_VANTAGE_API_KEY not set, currency and metal lookups will fall back");
        }
        let finnhub_api_key = get("FINNHUB_API_KEY").unwrap_or_default();
        if finnhub_api_key.is_empty() {
            warn!("FINNHUB_API_KEY not set, stock and economic calendar lookups will fall back");
        }

        Ok(Self {
            server: ServerConfig {
                port,
                cors_allowed_origin: get("CORS_ALLOWED_ORIGIN")
                    .unwrap_or(defaults.server.cors_allowed_origin),
            },
            database: DatabaseConfig {
                url: get("DATABASE_URL").or_else(|| get("POSTGRES_URL")),
                max_connections,
            },
            providers: ProviderConfig {
                alpha_vantage_api_key,
                finnhub_api_key,
                alpha_vantage_base_url: get("ALPHA_VANTAGE_BASE_URL")
                    .unwrap_or(defaults.providers.alpha_vantage_base_url),
                finnhub_base_url: get("FINNHUB_BASE_URL")
                    .unwrap_or(defaults.providers.finnhub_base_url),
                currency_from: get("CURRENCY_FROM")
                    .map(|c| c.to_uppercase())
                    .unwrap_or(defaults.providers.currency_from),
                currency_to: get("CURRENCY_TO")
                    .map(|c| c.to_uppercase())
                    .unwrap_or(defaults.providers.currency_to),
                timeout_seconds,
            },
            chat: ChatConfig { persist_faq_hits },
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 4000,
                cors_allowed_origin: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
            },
            providers: ProviderConfig {
                alpha_vantage_api_key: String::new(),
                finnhub_api_key: String::new(),
                alpha_vantage_base_url: "https://www.alphavantage.co".to_string(),
                finnhub_base_url: "https://finnhub.io/api/v1".to_string(),
                currency_from: "USD".to_string(),
                currency_to: "EUR".to_string(),
                timeout_seconds: 10,
            },
            chat: ChatConfig {
                persist_faq_hits: false,
            },
        }
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AdvisorError::ConfigError(format!("Invalid {} value: {}", key, raw)))
}
