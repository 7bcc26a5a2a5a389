//! Topic Classifier
//!
//! Routes a chat message to at most one financial data topic:
//! - Currency: "exchange rate", "currency"
//! - Stock gainers: "stock", "market gainers"
//! - Economic events: "economic event", "inflation"
//! - Metal prices: "gold", "silver", "metal prices"
//!
//! Rules are checked in table order and the first match wins.

use crate::models::Topic;

/// A single dispatch rule: any keyword present selects the topic
pub struct TopicRule {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
}

/// Static dispatch table, zero allocation
pub const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: Topic::Currency,
        keywords: &["exchange rate", "currency"],
    },
    TopicRule {
        topic: Topic::StockGainers,
        keywords: &["stock", "market gainers"],
    },
    TopicRule {
        topic: Topic::EconomicEvents,
        keywords: &["economic event", "inflation"],
    },
    TopicRule {
        topic: Topic::MetalPrices,
        keywords: &["gold", "silver", "metal prices"],
    },
];

impl TopicRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
    }
}

/// Topic classifier
pub struct TopicClassifier;

impl TopicClassifier {
    /// Classify by case-insensitive substring containment
    pub fn classify(message: &str) -> Option<Topic> {
        let lowered = message.to_lowercase();

        TOPIC_RULES
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_topic() {
        let cases = vec![
            ("What is the USD exchange rate?", Topic::Currency),
            ("currency outlook", Topic::Currency),
            ("show me stock movers", Topic::StockGainers),
            ("today's market gainers", Topic::StockGainers),
            ("any economic event this week", Topic::EconomicEvents),
            ("is inflation rising", Topic::EconomicEvents),
            ("What's the gold price today?", Topic::MetalPrices),
            ("silver trend", Topic::MetalPrices),
            ("latest metal prices", Topic::MetalPrices),
        ];

        for (message, expected) in cases {
            assert_eq!(TopicClassifier::classify(message), Some(expected), "{}", message);
        }
    }

    #[test]
    fn test_currency_precedes_stock() {
        assert_eq!(
            TopicClassifier::classify("does the stock market move the currency?"),
            Some(Topic::Currency)
        );
    }

    #[test]
    fn test_stock_precedes_metals() {
        assert_eq!(
            TopicClassifier::classify("gold mining stock"),
            Some(Topic::StockGainers)
        );
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert_eq!(TopicClassifier::classify("STOCKS!"), Some(Topic::StockGainers));
        // substring, not token, matching
        assert_eq!(TopicClassifier::classify("goldfish"), Some(Topic::MetalPrices));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(TopicClassifier::classify("hello there"), None);
        assert_eq!(TopicClassifier::classify("how do I budget"), None);
    }
}
