//! osint-relay — ingestion relay for monitored Telegram channels.
//!
//! Pulls messages from configured channels, runs them through a cheap
//! content filter, a dominant-color media gate and an LLM relevance
//! classifier, scores and persists the survivors, republishes accepted
//! items, and exposes a small review API over the item store.

pub mod api;
pub mod channels;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod store;

pub use config::{LoopConfig, RelayConfig, SourceConfig};
pub use error::{Error, Result};
