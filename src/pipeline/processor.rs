//! Per-message processing: filter, dedup, media gate, classify, score,
//! persist, publish.
//!
//! The processor is deliberately stateless between messages except for the
//! per-pass seen-fingerprint set the caller threads through. Everything
//! durable lives in the item store.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::channels::{MessageSource, PublishRequest, PublishTarget};
use crate::classifier::{RelevanceClassifier, Rewrite};
use crate::config::SourceConfig;
use crate::error::PipelineError;
use crate::fingerprint::{exact_fingerprint, similarity_fingerprint};
use crate::pipeline::filter::ContentFilter;
use crate::pipeline::media::{GateVerdict, MediaGate};
use crate::pipeline::scoring::Scorer;
use crate::pipeline::types::{ProcessOutcome, RejectReason, SourceMessage, remove_hashtags};
use crate::store::{
    Classification, InsertOutcome, ItemStatus, ItemStore, MediaKind, NewItem, TransitionExtra,
};

/// Collaborators and policies for the ingestion pipeline.
pub struct Processor {
    store: Arc<dyn ItemStore>,
    source: Arc<dyn MessageSource>,
    classifier: Arc<dyn RelevanceClassifier>,
    publisher: Arc<dyn PublishTarget>,
    filter: ContentFilter,
    scorer: Scorer,
    gate: MediaGate,
    media_dir: PathBuf,
}

impl Processor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ItemStore>,
        source: Arc<dyn MessageSource>,
        classifier: Arc<dyn RelevanceClassifier>,
        publisher: Arc<dyn PublishTarget>,
        filter: ContentFilter,
        scorer: Scorer,
        gate: MediaGate,
        media_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            source,
            classifier,
            publisher,
            filter,
            scorer,
            gate,
            media_dir,
        }
    }

    /// Run one message through the full pipeline.
    ///
    /// `seen` is the per-pass exact-fingerprint set; this method adds the
    /// message's fingerprint to it once the message gets past the filter.
    pub async fn process_message(
        &self,
        message: &SourceMessage,
        source: &SourceConfig,
        seen: &mut HashSet<String>,
    ) -> Result<ProcessOutcome, PipelineError> {
        // Cheap rules first, before any hashing or I/O.
        if let Some(reason) = self.filter.evaluate(message, &source.allowed_senders) {
            debug!(
                source = %message.source,
                message_id = message.id,
                reason = reason.label(),
                "Message filtered"
            );
            return Ok(ProcessOutcome::Filtered(reason));
        }

        let fingerprint = exact_fingerprint(&message.source, &message.text);
        if self.filter.is_seen_this_run(&fingerprint, seen) {
            return Ok(ProcessOutcome::Filtered(RejectReason::DuplicateFingerprint));
        }
        if self.store.content_fingerprint_exists(&fingerprint).await? {
            seen.insert(fingerprint);
            return Ok(ProcessOutcome::Filtered(RejectReason::DuplicateFingerprint));
        }
        if self
            .store
            .get_by_external_id(&message.external_id())
            .await?
            .is_some()
        {
            seen.insert(fingerprint);
            return Ok(ProcessOutcome::Filtered(RejectReason::AlreadyStored));
        }
        seen.insert(fingerprint.clone());

        // Media gate. Photos only; videos pass untouched. Download failures
        // fail open so a broken attachment cannot block the text.
        let mut local_media: Option<(MediaKind, PathBuf)> = None;
        if let Some(media) = &message.media {
            match self.source.download_media(media, &self.media_dir).await {
                Ok(path) => {
                    if media.kind == MediaKind::Photo
                        && self.gate.inspect(&path) == GateVerdict::Rejected
                    {
                        info!(
                            source = %message.source,
                            message_id = message.id,
                            "Photo rejected by media gate"
                        );
                        return Ok(ProcessOutcome::MediaRejected);
                    }
                    local_media = Some((media.kind, path));
                }
                Err(e) => {
                    warn!(
                        source = %message.source,
                        message_id = message.id,
                        error = %e,
                        "Media download failed, continuing without attachment"
                    );
                }
            }
        }

        // Classifier verdict. Any error fails closed: the item is stored
        // as rejected so it is never re-sent to the model.
        let clean_text = remove_hashtags(&message.text);
        let verdict = match self.classifier.classify(clean_text.trim()).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    source = %message.source,
                    message_id = message.id,
                    error = %e,
                    "Classifier failed, rejecting"
                );
                Rewrite::Skip
            }
        };

        // Scores run on the hashtag-stripped text too, so tag spam cannot
        // inflate the length band or the term bonuses.
        let scores = self.scorer.score(&clean_text);
        let media_kind = message.media.as_ref().map(|m| m.kind).unwrap_or(MediaKind::None);
        let media_ref = message.media.as_ref().map(|m| m.file_id.clone());

        let new_item = |rewritten: Option<String>, classification, status| NewItem {
            external_id: message.external_id(),
            source_name: message.source.clone(),
            sender_name: message.sender_name.clone(),
            raw_text: message.text.clone(),
            rewritten_text: rewritten,
            media_kind,
            media_ref: media_ref.clone(),
            classification,
            quality_score: scores.quality,
            bias_score: scores.bias,
            status,
            content_fingerprint: fingerprint.clone(),
            similarity_fingerprint: similarity_fingerprint(&message.text),
            priority: source.priority,
            source_url: message.link.clone(),
        };

        let rewrite = match verdict {
            Rewrite::Relevant(text) => text,
            Rewrite::Skip => {
                let item = new_item(None, Classification::NonGeopolitical, ItemStatus::Rejected);
                return match self.store.insert(item).await? {
                    InsertOutcome::Inserted(item_id) => {
                        debug!(item_id = %item_id, "Item stored as rejected");
                        Ok(ProcessOutcome::Rejected { item_id })
                    }
                    InsertOutcome::AlreadyExists => Ok(ProcessOutcome::Duplicate),
                };
            }
        };

        let item = new_item(
            Some(rewrite.clone()),
            Classification::Geopolitical,
            ItemStatus::Pending,
        );
        let item_id = match self.store.insert(item).await? {
            InsertOutcome::Inserted(id) => id,
            InsertOutcome::AlreadyExists => return Ok(ProcessOutcome::Duplicate),
        };

        // Publish, then record the outcome. The item is already durable;
        // a publish failure leaves it in publish_failed for manual retry.
        let request = PublishRequest {
            text: rewrite,
            media: local_media,
            source_link: message.link.clone(),
        };
        match self.publisher.publish(&request).await {
            Ok(receipt) => {
                self.store
                    .transition(
                        &item_id,
                        ItemStatus::Posted,
                        TransitionExtra {
                            external_publish_url: receipt.url,
                        },
                    )
                    .await?;
                info!(item_id = %item_id, source = %message.source, "Item published");
                Ok(ProcessOutcome::Published { item_id })
            }
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "Publish failed");
                self.store
                    .transition(&item_id, ItemStatus::PublishFailed, TransitionExtra::default())
                    .await?;
                Ok(ProcessOutcome::PublishFailed { item_id })
            }
        }
    }
}
