//! Core data models for the advisor chat

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

//
// ================= Enums =================
//

/// Polarity label derived from the sign of a sentiment score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

/// Financial data category a message can be routed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Currency,
    StockGainers,
    EconomicEvents,
    MetalPrices,
}

//
// ================= Sentiment =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentScore {
    pub score: i32,
    /// Score divided by the number of tokens
    pub comparative: f32,
    pub label: SentimentLabel,
}

//
// ================= Chat Exchange =================
//

/// One persisted message/response pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatExchange {
    pub exchange_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl ChatExchange {
    pub fn new(user_id: Uuid, message: String, response: String) -> Self {
        Self {
            exchange_id: Uuid::new_v4(),
            user_id,
            message,
            response,
            created_at: Utc::now(),
        }
    }
}

/// What the responder hands back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    pub faq_hit: bool,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Topic::Currency => "currency exchange rates",
            Topic::StockGainers => "stock market gainers",
            Topic::EconomicEvents => "economic events",
            Topic::MetalPrices => "metal prices",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_follows_sign() {
        assert_eq!(SentimentLabel::from_score(3), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(-1), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_score(0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_topic_display() {
        assert_eq!(Topic::MetalPrices.to_string(), "metal prices");
        assert_eq!(Topic::StockGainers.to_string(), "stock market gainers");
    }

    #[test]
    fn test_exchange_serializes_flat() {
        let exchange = ChatExchange::new(
            Uuid::new_v4(),
            "hello".to_string(),
            "hi there".to_string(),
        );
        let json = serde_json::to_value(&exchange).unwrap();
        assert_eq!(json["message"], "hello");
        assert_eq!(json["response"], "hi there");
        assert!(json.get("created_at").is_some());
    }
}
