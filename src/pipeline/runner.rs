//! Polling loop: fetch, process, sweep, sleep, repeat.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::channels::MessageSource;
use crate::config::{LoopConfig, RelayConfig};
use crate::error::PipelineError;
use crate::pipeline::processor::Processor;
use crate::pipeline::types::ProcessOutcome;
use crate::store::ItemStore;

/// Tallies from one full pass over all sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    pub fetched: usize,
    pub published: usize,
    pub publish_failed: usize,
    pub rejected: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub errors: usize,
}

/// Drives the processor on a fixed cadence.
pub struct Runner {
    processor: Processor,
    source: Arc<dyn MessageSource>,
    store: Arc<dyn ItemStore>,
    config: RelayConfig,
}

impl Runner {
    pub fn new(
        processor: Processor,
        source: Arc<dyn MessageSource>,
        store: Arc<dyn ItemStore>,
        config: RelayConfig,
    ) -> Self {
        Self {
            processor,
            source,
            store,
            config,
        }
    }

    /// One pass: a batch from every source, then the retention sweep.
    ///
    /// A failure on one message or one source never aborts the pass; it is
    /// counted and the pass moves on.
    pub async fn run_pass(&self) -> Result<PassStats, PipelineError> {
        let cadence: &LoopConfig = &self.config.cadence;
        let mut stats = PassStats::default();
        // Exact fingerprints handled this pass; duplicates within a batch
        // never reach the classifier.
        let mut seen: HashSet<String> = HashSet::new();

        for source in &self.config.sources {
            let messages = match self.source.fetch(source, cadence.batch_size).await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(source = %source.name, error = %e, "Fetch failed, skipping source");
                    stats.errors += 1;
                    continue;
                }
            };
            stats.fetched += messages.len();

            for message in &messages {
                match self
                    .processor
                    .process_message(message, source, &mut seen)
                    .await
                {
                    Ok(outcome) => {
                        match &outcome {
                            ProcessOutcome::Published { .. } => stats.published += 1,
                            ProcessOutcome::PublishFailed { .. } => stats.publish_failed += 1,
                            ProcessOutcome::Rejected { .. } => stats.rejected += 1,
                            ProcessOutcome::Filtered(_) | ProcessOutcome::MediaRejected => {
                                stats.filtered += 1
                            }
                            ProcessOutcome::Duplicate => stats.duplicates += 1,
                        }
                        // Settle between publishes so the output channel
                        // does not get a burst.
                        if outcome.accepted() && !cadence.publish_delay.is_zero() {
                            tokio::time::sleep(cadence.publish_delay).await;
                        }
                    }
                    Err(e) => {
                        error!(
                            source = %message.source,
                            message_id = message.id,
                            error = %e,
                            "Message processing failed"
                        );
                        stats.errors += 1;
                    }
                }
            }
        }

        match self.store.retention_sweep(self.config.retention_days).await {
            Ok(archived) if archived > 0 => {
                info!(archived, "Retention sweep archived items");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Retention sweep failed");
                stats.errors += 1;
            }
        }

        info!(
            fetched = stats.fetched,
            published = stats.published,
            publish_failed = stats.publish_failed,
            rejected = stats.rejected,
            filtered = stats.filtered,
            duplicates = stats.duplicates,
            errors = stats.errors,
            "Pass complete"
        );
        Ok(stats)
    }

    /// Run passes forever. Never returns under normal operation.
    pub async fn run_forever(&self) {
        info!(
            sources = self.config.sources.len(),
            interval_secs = self.config.cadence.pass_interval.as_secs(),
            "Ingestion loop started"
        );
        loop {
            match self.run_pass().await {
                Ok(_) => {
                    tokio::time::sleep(self.config.cadence.pass_interval).await;
                }
                Err(e) => {
                    error!(error = %e, "Pass failed");
                    tokio::time::sleep(self.config.cadence.error_backoff).await;
                }
            }
        }
    }
}
