//! AI-assisted symptom analysis

pub mod analyzer;
pub mod backoff;
pub mod cache;
pub mod client;
pub mod insight;
pub mod provider;

pub use analyzer::{AiAnalyzer, UsageStats};
pub use client::ClaudeClient;
pub use provider::{AiError, Completion, InsightProvider};
