//! HTTP-backed providers for Alpha Vantage and Finnhub
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::DataProvider;
use crate::config::ProviderConfig;
use crate::error::AdvisorError;
use crate::models::Topic;
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Shared, connection-pooled client
#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client })
    }

    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value> {
        // Errors drop the URL: the query string carries the API key
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                AdvisorError::ProviderError(format!("Request to {} failed: {}", url, e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::ProviderError(format!(
                "{} returned {}",
                url, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            AdvisorError::ProviderError(format!("Invalid JSON from {}: {}", url, e.without_url()))
        })
    }
}

/// A provider backed by one GET endpoint
pub struct EndpointProvider {
    http: ProviderHttpClient,
    topic: Topic,
    url: String,
    query: Vec<(String, String)>,
    /// Top-level field holding the data; `None` keeps the whole body
    extract: Option<&'static str>,
    empty_text: &'static str,
    fallback: &'static str,
}

impl EndpointProvider {
    pub fn currency(http: ProviderHttpClient, config: &ProviderConfig) -> Self {
        Self {
            http,
            topic: Topic::Currency,
            url: join_url(&config.alpha_vantage_base_url, "/query"),
            query: vec![
                ("function".into(), "CURRENCY_EXCHANGE_RATE".into()),
                ("from_currency".into(), config.currency_from.clone()),
                ("to_currency".into(), config.currency_to.clone()),
                ("apikey".into(), config.alpha_vantage_api_key.clone()),
            ],
            extract: Some("Realtime Currency Exchange Rate"),
            empty_text: "No data available.",
            fallback: "Unable to fetch currency exchange rates.",
        }
    }

    pub fn stock_gainers(http: ProviderHttpClient, config: &ProviderConfig) -> Self {
        Self {
            http,
            topic: Topic::StockGainers,
            url: join_url(&config.finnhub_base_url, "/stock/market-gainers"),
            query: vec![("token".into(), config.finnhub_api_key.clone())],
            extract: None,
            empty_text: "No stock gainers data available.",
            fallback: "Unable to fetch stock gainers.",
        }
    }

    pub fn economic_calendar(http: ProviderHttpClient, config: &ProviderConfig) -> Self {
        Self {
            http,
            topic: Topic::EconomicEvents,
            url: join_url(&config.finnhub_base_url, "/calendar/economic"),
            query: vec![("token".into(), config.finnhub_api_key.clone())],
            extract: Some("economicCalendar"),
            empty_text: "No economic events available.",
            fallback: "Unable to fetch economic events.",
        }
    }

    pub fn metal_prices(http: ProviderHttpClient, config: &ProviderConfig) -> Self {
        Self {
            http,
            topic: Topic::MetalPrices,
            url: join_url(&config.alpha_vantage_base_url, "/query"),
            query: vec![
                ("function".into(), "GLOBAL_METAL_PRICE".into()),
                ("apikey".into(), config.alpha_vantage_api_key.clone()),
            ],
            extract: Some("Global Metal Price"),
            empty_text: "No data available.",
            fallback: "Unable to fetch metal prices.",
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl DataProvider for EndpointProvider {
    fn topic(&self) -> Topic {
        self.topic
    }

    fn fallback(&self) -> &str {
        self.fallback
    }

    async fn fetch(&self) -> Result<Value> {
        debug!(topic = ?self.topic, url = %self.url, "Fetching provider data");

        let body = self.http.get_json(&self.url, &self.query).await?;
        Ok(extract_payload(body, self.extract, self.empty_text))
    }
}

/// Pick the data field out of a successful body. A missing or empty field
/// is "no data", not a failure.
fn extract_payload(body: Value, field: Option<&str>, empty_text: &str) -> Value {
    let payload = match field {
        Some(key) => body.get(key).cloned().unwrap_or(Value::Null),
        None => body,
    };

    if is_empty(&payload) {
        Value::String(empty_text.to_string())
    } else {
        payload
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::fetch_or_fallback;
    use serde_json::json;

    fn test_config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            alpha_vantage_api_key: "demo".into(),
            finnhub_api_key: "demo".into(),
            alpha_vantage_base_url: base_url.into(),
            finnhub_base_url: format!("{}/api/v1/", base_url.trim_end_matches('/')),
            currency_from: "USD".into(),
            currency_to: "JPY".into(),
            timeout_seconds: 2,
        }
    }

    #[test]
    fn test_extract_field() {
        let body = json!({"Global Metal Price": {"price": 1900}});
        assert_eq!(
            extract_payload(body, Some("Global Metal Price"), "No data available."),
            json!({"price": 1900})
        );
    }

    #[test]
    fn test_missing_field_is_no_data() {
        let body = json!({"Note": "Thank you for using Alpha Vantage!"});
        assert_eq!(
            extract_payload(body, Some("Realtime Currency Exchange Rate"), "No data available."),
            json!("No data available.")
        );
    }

    #[test]
    fn test_whole_body_kept() {
        let body = json!([{"symbol": "AAPL", "change": 3.2}]);
        assert_eq!(
            extract_payload(body.clone(), None, "No stock gainers data available."),
            body
        );
        assert_eq!(
            extract_payload(json!([]), None, "No stock gainers data available."),
            json!("No stock gainers data available.")
        );
    }

    #[test]
    fn test_urls() {
        let http = ProviderHttpClient::new(1).unwrap();
        let config = test_config("http://example.test/");

        assert_eq!(
            EndpointProvider::currency(http.clone(), &config).url(),
            "http://example.test/query"
        );
        assert_eq!(
            EndpointProvider::economic_calendar(http, &config).url(),
            "http://example.test/api/v1/calendar/economic"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_falls_back() {
        let http = ProviderHttpClient::new(2).unwrap();
        // Port 9 (discard) on loopback refuses connections
        let provider = EndpointProvider::metal_prices(http, &test_config("http://127.0.0.1:9"));

        assert!(provider.fetch().await.is_err());
        assert_eq!(
            fetch_or_fallback(&provider).await,
            json!("Unable to fetch metal prices.")
        );
    }
}
