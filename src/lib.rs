//! Financial Advisor Chat
//!
//! An authenticated chat service that:
//! - Answers known questions straight from an FAQ table
//! - Scores the sentiment of every other message
//! - Routes the message to at most one financial data provider by keyword
//! - Appends a random financial tip
//! - Persists each composed exchange and serves per-user history
//!
//! PIPELINE:
//! MESSAGE → FAQ? → SENTIMENT → TOPIC → FETCH → TIP → COMPOSE → PERSIST

pub mod api;
pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod providers;
pub mod responder;
pub mod sentiment;
pub mod store;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::TopicClassifier;
pub use responder::ChatResponder;
