//! Ingestion pipeline: filter → dedup → media gate → classify → score →
//! persist → publish.

pub mod filter;
pub mod media;
pub mod processor;
pub mod runner;
pub mod scoring;
pub mod types;

pub use filter::{ContentFilter, FilterPolicy};
pub use media::{GateVerdict, MediaGate};
pub use processor::Processor;
pub use runner::{PassStats, Runner};
pub use scoring::{ContentScores, Scorer, ScoringPolicy};
pub use types::{MediaRef, ProcessOutcome, RejectReason, SourceMessage};
