//! Relevance classification and rewriting.
//!
//! The classifier is the single external-model dependency of the pipeline.
//! It answers one question per message: is this geopolitically relevant,
//! and if so, what is the neutral post-ready rewrite? Everything else
//! (filtering, scoring, dedup) is local and deterministic.

mod openai;

pub use openai::OpenAiClassifier;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClassifierError;

/// Classifier verdict for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Relevant; carries the rewritten text (at most 280 chars).
    Relevant(String),
    /// Not geopolitically relevant.
    Skip,
}

/// Retry schedule for transient classifier failures.
///
/// Delay doubles per attempt starting from `base_delay`. The caller decides
/// what happens after `max_retries` attempts are exhausted (the pipeline
/// fails closed and rejects the item).
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the given retry attempt (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// External relevance classifier.
#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    /// Classify and rewrite one message text. Hashtags have already been
    /// stripped by the caller.
    async fn classify(&self, text: &str) -> Result<Rewrite, ClassifierError>;
}
