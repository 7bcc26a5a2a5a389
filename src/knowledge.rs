//! Static FAQ answers and financial tips

use crate::error::AdvisorError;
use crate::Result;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

const DEFAULT_FAQS: &[(&str, &str)] = &[
    (
        "how to save money",
        "Save at least 20% of your income each month and avoid impulse purchases.",
    ),
    (
        "best way to invest",
        "Diversify your investments and consider low-cost index funds.",
    ),
    (
        "how to improve credit score",
        "Pay bills on time and keep credit utilization below 30%.",
    ),
    (
        "how to start budgeting",
        "Track your expenses and allocate your income into savings, needs, and wants.",
    ),
];

const DEFAULT_TIPS: &[&str] = &[
    "Save at least 20% of your income each month.",
    "Avoid impulse buying by waiting 24 hours before making a purchase.",
    "Invest in diversified assets to reduce risk.",
    "Use high-yield savings accounts for emergency funds.",
    "Pay off high-interest debt as soon as possible to avoid extra fees.",
];

/// Lower-case and trim, the form FAQ keys are stored in
pub fn normalize_question(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Read-only question → answer lookup
#[derive(Debug, Clone)]
pub struct FaqTable {
    entries: HashMap<String, String>,
}

impl FaqTable {
    pub fn new<I, Q, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: AsRef<str>,
        A: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(q, a)| (normalize_question(q.as_ref()), a.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, message: &str) -> Option<&str> {
        self.entries
            .get(&normalize_question(message))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FaqTable {
    fn default() -> Self {
        Self::new(DEFAULT_FAQS.iter().copied())
    }
}

/// Ordered, never empty tip list with an injectable random source
pub struct TipBook {
    tips: Vec<String>,
    rng: Mutex<Box<dyn rand::RngCore + Send>>,
}

impl TipBook {
    pub fn new<I, S>(tips: I, rng: Box<dyn rand::RngCore + Send>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tips: Vec<String> = tips.into_iter().map(Into::into).collect();
        if tips.is_empty() {
            return Err(AdvisorError::ConfigError(
                "Tip list must contain at least one tip".to_string(),
            ));
        }

        Ok(Self {
            tips,
            rng: Mutex::new(rng),
        })
    }

    /// Default tips drawn with the supplied random source
    pub fn with_rng(rng: Box<dyn rand::RngCore + Send>) -> Self {
        Self {
            tips: DEFAULT_TIPS.iter().map(|t| t.to_string()).collect(),
            rng: Mutex::new(rng),
        }
    }

    /// Uniform draw over the list
    pub fn pick(&self) -> &str {
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_range(0..self.tips.len())
        };

        &self.tips[index]
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }
}

impl Default for TipBook {
    fn default() -> Self {
        Self::with_rng(Box::new(rand::rngs::StdRng::from_entropy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn test_faq_lookup_normalizes() {
        let faqs = FaqTable::default();
        assert!(faqs.lookup("  How To Save Money ").is_some());
        assert!(faqs.lookup("how to save money?").is_none());
        assert_eq!(faqs.len(), 4);
    }

    #[test]
    fn test_custom_faq_keys_are_normalized() {
        let faqs = FaqTable::new(vec![("  What Is APR ", "Annual percentage rate.")]);
        assert_eq!(faqs.lookup("what is apr"), Some("Annual percentage rate."));
    }

    #[test]
    fn test_pick_is_deterministic_with_seed() {
        let a = TipBook::with_rng(Box::new(StdRng::seed_from_u64(7)));
        let b = TipBook::with_rng(Box::new(StdRng::seed_from_u64(7)));

        let first: Vec<_> = (0..10).map(|_| a.pick().to_string()).collect();
        let second: Vec<_> = (0..10).map(|_| b.pick().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pick_stays_in_list() {
        let book = TipBook::with_rng(Box::new(StdRng::seed_from_u64(42)));
        for _ in 0..50 {
            let tip = book.pick();
            assert!(DEFAULT_TIPS.contains(&tip));
        }
    }

    #[test]
    fn test_empty_book_rejected() {
        let result = TipBook::new(Vec::<String>::new(), Box::new(StdRng::seed_from_u64(1)));
        assert!(matches!(result, Err(AdvisorError::ConfigError(_))));
    }

    #[test]
    fn test_single_tip_always_drawn() {
        let book = TipBook::new(vec!["Only tip."], Box::new(StdRng::seed_from_u64(3))).unwrap();
        assert_eq!(book.pick(), "Only tip.");
    }
}
