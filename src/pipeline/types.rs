//! Shared types for the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::model::MediaKind;

/// One raw message pulled from an upstream source.
///
/// Source adapters convert their native format into this struct; the
/// pipeline runs it through filter → fingerprint → gate → classifier →
/// scoring → store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMessage {
    /// Source-native numeric message id.
    pub id: i64,
    /// Source (channel) name this message came from.
    pub source: String,
    /// Display name of the sender, as the source reports it.
    pub sender_name: String,
    /// Raw text body.
    pub text: String,
    /// Attachment, if any.
    pub media: Option<MediaRef>,
    /// When the message originated upstream.
    pub sent_at: DateTime<Utc>,
    /// Deep link to the original message, when the source can build one.
    pub link: Option<String>,
}

impl SourceMessage {
    /// Stable identity derived from (source, source-native id).
    ///
    /// Unique key preventing duplicate ingestion across restarts.
    pub fn external_id(&self) -> String {
        format!("{}_{}", self.source, self.id)
    }
}

/// Opaque handle to an attachment, resolvable by the owning source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    /// Source-native file handle (e.g. a Bot API file id).
    pub file_id: String,
}

/// Why the content filter rejected a message.
///
/// Filter rejections happen before fingerprint persistence and before any
/// classifier call, so rejected messages are cheap and leave no trace in
/// the item store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Sender is not on the source's allow-list.
    SenderNotAllowed(String),
    /// A blocked keyword matched (case-insensitive substring).
    BlockedKeyword(String),
    /// Text contains a URL or a blocked symbol.
    UrlOrBlockedSymbol,
    /// Message is younger than the minimum age and may still be edited.
    TooRecent { age_secs: i64 },
    /// Exact fingerprint already handled this run.
    DuplicateFingerprint,
    /// An item with this external id already exists in the store.
    AlreadyStored,
}

impl RejectReason {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SenderNotAllowed(_) => "sender_not_allowed",
            Self::BlockedKeyword(_) => "blocked_keyword",
            Self::UrlOrBlockedSymbol => "url_or_blocked_symbol",
            Self::TooRecent { .. } => "too_recent",
            Self::DuplicateFingerprint => "duplicate_fingerprint",
            Self::AlreadyStored => "already_stored",
        }
    }
}

/// Result of running one message through the pipeline.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// Dropped by the content filter; nothing stored.
    Filtered(RejectReason),
    /// Photo failed the dominant-color gate; nothing stored.
    MediaRejected,
    /// Classifier said not relevant; stored as rejected for audit.
    Rejected { item_id: String },
    /// Accepted, stored, and confirmed published downstream.
    Published { item_id: String },
    /// Accepted and stored, but the downstream publish failed.
    PublishFailed { item_id: String },
    /// Insert hit an existing external id (idempotent no-op).
    Duplicate,
}

impl ProcessOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Filtered(_) => "filtered",
            Self::MediaRejected => "media_rejected",
            Self::Rejected { .. } => "rejected",
            Self::Published { .. } => "published",
            Self::PublishFailed { .. } => "publish_failed",
            Self::Duplicate => "duplicate",
        }
    }

    /// Whether the message was accepted and handed to publish targets.
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Published { .. } | Self::PublishFailed { .. })
    }
}

/// Strip `#hashtag` tokens (and their trailing whitespace) from text.
pub fn remove_hashtags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '#' {
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    break;
                }
                chars.next();
            }
            // swallow the whitespace run after the tag
            while let Some(&next) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                chars.next();
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_combines_source_and_message_id() {
        let msg = SourceMessage {
            id: 42,
            source: "worldnews".into(),
            sender_name: "World News".into(),
            text: "hello".into(),
            media: None,
            sent_at: Utc::now(),
            link: None,
        };
        assert_eq!(msg.external_id(), "worldnews_42");
    }

    #[test]
    fn remove_hashtags_strips_tags_and_spacing() {
        assert_eq!(
            remove_hashtags("Ceasefire confirmed #breaking #news today"),
            "Ceasefire confirmed today"
        );
        assert_eq!(remove_hashtags("#lead story"), "story");
        assert_eq!(remove_hashtags("no tags here"), "no tags here");
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(
            ProcessOutcome::Filtered(RejectReason::UrlOrBlockedSymbol).label(),
            "filtered"
        );
        assert!(ProcessOutcome::Published { item_id: "x".into() }.accepted());
        assert!(!ProcessOutcome::Duplicate.accepted());
    }
}
