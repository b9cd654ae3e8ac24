//! End-to-end pipeline tests against an in-memory store.
//!
//! Drives the runner with fake source, classifier and publish-target
//! implementations and asserts on the stored items afterwards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use osint_relay::channels::{
    MessageSource, PublishReceipt, PublishRequest, PublishTarget,
};
use osint_relay::classifier::{RelevanceClassifier, Rewrite};
use osint_relay::config::{RelayConfig, SourceConfig};
use osint_relay::error::{ChannelError, ClassifierError};
use osint_relay::pipeline::{
    ContentFilter, FilterPolicy, MediaGate, Processor, Runner, Scorer, ScoringPolicy,
    SourceMessage,
};
use osint_relay::store::{ItemStatus, ItemStore, LibSqlBackend};

// ── Fakes ───────────────────────────────────────────────────────────

struct QueueSource {
    messages: Mutex<Vec<SourceMessage>>,
}

impl QueueSource {
    fn new(messages: Vec<SourceMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
        }
    }
}

#[async_trait]
impl MessageSource for QueueSource {
    async fn fetch(
        &self,
        source: &SourceConfig,
        limit: usize,
    ) -> Result<Vec<SourceMessage>, ChannelError> {
        let mut messages = self.messages.lock().unwrap();
        let mut batch = Vec::new();
        let mut i = 0;
        while i < messages.len() && batch.len() < limit {
            if messages[i].source == source.name {
                batch.push(messages.remove(i));
            } else {
                i += 1;
            }
        }
        Ok(batch)
    }

    async fn download_media(
        &self,
        _media: &osint_relay::pipeline::MediaRef,
        _dest_dir: &Path,
    ) -> Result<PathBuf, ChannelError> {
        Err(ChannelError::MediaDownload {
            source: "queue".to_string(),
            reason: "fixtures carry no media".to_string(),
        })
    }
}

/// Treats text mentioning "gossip" as irrelevant, rewrites the rest.
struct KeywordClassifier;

#[async_trait]
impl RelevanceClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Rewrite, ClassifierError> {
        if text.contains("gossip") {
            return Ok(Rewrite::Skip);
        }
        Ok(Rewrite::Relevant(text.to_string()))
    }
}

#[derive(Default)]
struct CapturingPublisher {
    published: Mutex<Vec<PublishRequest>>,
}

#[async_trait]
impl PublishTarget for CapturingPublisher {
    fn name(&self) -> &str {
        "capturing"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ChannelError> {
        let n = {
            let mut published = self.published.lock().unwrap();
            published.push(request.clone());
            published.len()
        };
        Ok(PublishReceipt {
            url: Some(format!("https://t.me/relayout/{n}")),
        })
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn message(id: i64, source: &str, sender: &str, text: &str) -> SourceMessage {
    SourceMessage {
        id,
        source: source.to_string(),
        sender_name: sender.to_string(),
        text: text.to_string(),
        media: None,
        sent_at: Utc::now() - ChronoDuration::seconds(600),
        link: Some(format!("https://t.me/{source}/{id}")),
    }
}

fn relay_config(sources: Vec<SourceConfig>) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.sources = sources;
    config.cadence.publish_delay = Duration::ZERO;
    config.cadence.batch_size = 10;
    config
}

struct Harness {
    runner: Runner,
    store: Arc<dyn ItemStore>,
    publisher: Arc<CapturingPublisher>,
}

async fn harness(messages: Vec<SourceMessage>, sources: Vec<SourceConfig>) -> Harness {
    let store: Arc<dyn ItemStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let source: Arc<dyn MessageSource> = Arc::new(QueueSource::new(messages));
    let publisher = Arc::new(CapturingPublisher::default());

    let processor = Processor::new(
        Arc::clone(&store),
        Arc::clone(&source),
        Arc::new(KeywordClassifier),
        Arc::clone(&publisher) as Arc<dyn PublishTarget>,
        ContentFilter::new(FilterPolicy::default()),
        Scorer::new(ScoringPolicy::default()),
        MediaGate::new(0.7),
        PathBuf::from("/tmp/relay-integration-media"),
    );
    let runner = Runner::new(processor, source, Arc::clone(&store), relay_config(sources));

    Harness {
        runner,
        store,
        publisher,
    }
}

fn open_source(name: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        allowed_senders: Vec::new(),
        priority: 1,
    }
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_batch_lands_in_the_right_states() {
    let h = harness(
        vec![
            message(1, "worldnews", "World News", "Officials confirm ceasefire talks resumed"),
            message(2, "worldnews", "World News", "celebrity gossip roundup for the weekend"),
            message(3, "worldnews", "World News", "Join our sponsor for a telegram premium deal"),
            message(4, "worldnews", "World News", "Details at https://example.com/live"),
        ],
        vec![open_source("worldnews")],
    )
    .await;

    let stats = h.runner.run_pass().await.unwrap();
    assert_eq!(stats.fetched, 4);
    assert_eq!(stats.published, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.filtered, 2);

    // Filtered messages never reach the store.
    let all = h.store.list_items(None, 100, 0).await.unwrap();
    assert_eq!(all.len(), 2);

    let posted = h
        .store
        .list_items(Some(ItemStatus::Posted), 100, 0)
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].external_id, "worldnews_1");
    assert_eq!(
        posted[0].external_publish_url.as_deref(),
        Some("https://t.me/relayout/1")
    );
    assert!(posted[0].posted_at.is_some());

    let rejected = h
        .store
        .list_items(Some(ItemStatus::Rejected), 100, 0)
        .await
        .unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].external_id, "worldnews_2");
    assert!(rejected[0].rewritten_text.is_none());

    // The published text carries the source attribution.
    let published = h.publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(
        published[0].source_link.as_deref(),
        Some("https://t.me/worldnews/1")
    );
}

#[tokio::test]
async fn sender_allow_list_is_enforced_per_source() {
    let h = harness(
        vec![
            message(1, "frontline", "Frontline Desk", "Strikes reported near the border"),
            message(2, "frontline", "Random Forwarder", "Strikes reported in the capital"),
        ],
        vec![SourceConfig {
            name: "frontline".to_string(),
            allowed_senders: vec!["Frontline Desk".to_string()],
            priority: 2,
        }],
    )
    .await;

    let stats = h.runner.run_pass().await.unwrap();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.filtered, 1);

    let posted = h
        .store
        .list_items(Some(ItemStatus::Posted), 100, 0)
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].sender_name, "Frontline Desk");
    assert_eq!(posted[0].priority, 2);
}

#[tokio::test]
async fn duplicate_handling_within_and_across_sources() {
    // Forwarded copies of the same report in two channels within one pass.
    let h = harness(
        vec![
            message(10, "worldnews", "World News", "Border crossing closed after shelling"),
            message(20, "mirror", "Mirror Feed", "Border crossing closed after shelling"),
        ],
        vec![open_source("worldnews"), open_source("mirror")],
    )
    .await;

    let stats = h.runner.run_pass().await.unwrap();
    assert_eq!(stats.published, 2);

    // Exact fingerprints differ across sources (the channel is part of the
    // hash); the similarity fingerprint is what links the copies.
    let posted = h
        .store
        .list_items(Some(ItemStatus::Posted), 100, 0)
        .await
        .unwrap();
    assert_eq!(posted.len(), 2);
    assert_eq!(
        posted[0].similarity_fingerprint,
        posted[1].similarity_fingerprint
    );

    // A literal repeat within the same source is dropped.
    let h2 = harness(
        vec![
            message(30, "worldnews", "World News", "Border crossing closed after shelling"),
            message(31, "worldnews", "World News", "Border crossing closed after shelling"),
        ],
        vec![open_source("worldnews")],
    )
    .await;
    let stats = h2.runner.run_pass().await.unwrap();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.filtered, 1);
}

#[tokio::test]
async fn reprocessing_after_restart_is_idempotent() {
    let messages = vec![message(
        5,
        "worldnews",
        "World News",
        "Officials confirm ceasefire talks resumed",
    )];
    let h = harness(messages.clone(), vec![open_source("worldnews")]).await;

    let stats = h.runner.run_pass().await.unwrap();
    assert_eq!(stats.published, 1);

    // The same message arriving again (replayed updates) is dropped by the
    // stored fingerprint, not re-published.
    {
        let mut queue = Vec::new();
        queue.push(messages[0].clone());
        let source = QueueSource::new(queue);
        let mut seen = HashSet::new();
        let processor = Processor::new(
            Arc::clone(&h.store),
            Arc::new(source),
            Arc::new(KeywordClassifier),
            Arc::clone(&h.publisher) as Arc<dyn PublishTarget>,
            ContentFilter::new(FilterPolicy::default()),
            Scorer::new(ScoringPolicy::default()),
            MediaGate::new(0.7),
            PathBuf::from("/tmp/relay-integration-media"),
        );
        let outcome = processor
            .process_message(&messages[0], &open_source("worldnews"), &mut seen)
            .await
            .unwrap();
        assert!(!outcome.accepted());
    }

    assert_eq!(h.store.list_items(None, 100, 0).await.unwrap().len(), 1);
    assert_eq!(h.publisher.published.lock().unwrap().len(), 1);
}
