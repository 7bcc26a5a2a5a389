//! Lexicon-based sentiment scoring
//!
//! Each word of the AFINN-165 list carries an integer weight in [-5, 5]. A
//! message scores the sum of its word weights; a weight is flipped when the
//! word directly follows a negator ("not good" scores like "bad").

mod lexicon;

use crate::models::{SentimentLabel, SentimentScore};
use lexicon::LEXICON;

const NEGATORS: &[&str] = &[
    "aren't", "can't", "cannot", "couldn't", "didn't", "doesn't", "don't", "isn't", "never",
    "no", "nor", "not", "shouldn't", "wasn't", "won't", "wouldn't",
];

/// Stateless scorer over the built-in lexicon
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score a raw message
    pub fn analyze(&self, text: &str) -> SentimentScore {
        let tokens = tokenize(text);

        let mut score = 0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(weight) = word_weight(token) else {
                continue;
            };

            let negated = i > 0 && NEGATORS.contains(&tokens[i - 1].as_str());
            score += if negated { -weight } else { weight };
        }

        let comparative = if tokens.is_empty() {
            0.0
        } else {
            score as f32 / tokens.len() as f32
        };

        SentimentScore {
            score,
            comparative,
            label: SentimentLabel::from_score(score),
        }
    }
}

fn word_weight(word: &str) -> Option<i32> {
    LEXICON
        .binary_search_by(|(w, _)| w.cmp(&word))
        .ok()
        .map(|idx| LEXICON[idx].1)
}

/// Lower-case words; punctuation other than apostrophes and hyphens splits
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}
