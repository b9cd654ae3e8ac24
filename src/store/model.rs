//! Item store data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a candidate item.
///
/// `pending → {approved, posted, publish_failed, rejected, archived,
/// deleted}`; `rejected → archived` via the retention sweep. Creation may
/// place an item directly into `rejected` (classifier said no). The store
/// does not police transition legality — that is the pipeline's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Approved,
    Posted,
    PublishFailed,
    Rejected,
    Archived,
    Deleted,
    Processed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Posted => "posted",
            Self::PublishFailed => "publish_failed",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
            Self::Processed => "processed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "posted" => Some(Self::Posted),
            "publish_failed" => Some(Self::PublishFailed),
            "rejected" => Some(Self::Rejected),
            "archived" => Some(Self::Archived),
            "deleted" => Some(Self::Deleted),
            "processed" => Some(Self::Processed),
            _ => None,
        }
    }
}

/// Topical classification from the relevance classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Geopolitical,
    NonGeopolitical,
    Unclassified,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geopolitical => "geopolitical",
            Self::NonGeopolitical => "non_geopolitical",
            Self::Unclassified => "unclassified",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "geopolitical" => Self::Geopolitical,
            "non_geopolitical" => Self::NonGeopolitical,
            _ => Self::Unclassified,
        }
    }
}

/// Kind of media attached to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    None,
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "photo" => Self::Photo,
            "video" => Self::Video,
            _ => Self::None,
        }
    }
}

/// One persisted candidate item.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateItem {
    pub id: String,
    pub external_id: String,
    pub source_name: String,
    pub sender_name: String,
    pub raw_text: String,
    pub rewritten_text: Option<String>,
    pub media_kind: MediaKind,
    pub media_ref: Option<String>,
    pub classification: Classification,
    pub quality_score: f64,
    pub bias_score: f64,
    pub status: ItemStatus,
    pub content_fingerprint: String,
    pub similarity_fingerprint: String,
    pub priority: i64,
    pub source_url: Option<String>,
    pub external_publish_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Insert payload; the store generates the surrogate id and timestamps.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub external_id: String,
    pub source_name: String,
    pub sender_name: String,
    pub raw_text: String,
    pub rewritten_text: Option<String>,
    pub media_kind: MediaKind,
    pub media_ref: Option<String>,
    pub classification: Classification,
    pub quality_score: f64,
    pub bias_score: f64,
    pub status: ItemStatus,
    pub content_fingerprint: String,
    pub similarity_fingerprint: String,
    pub priority: i64,
    pub source_url: Option<String>,
}

/// Result of an insert attempt.
///
/// `AlreadyExists` is the idempotency contract: re-inserting the same
/// external id is a normal, expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(String),
    AlreadyExists,
}

impl InsertOutcome {
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Inserted(id) => Some(id),
            Self::AlreadyExists => None,
        }
    }
}

/// Extra fields applied during a status transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionExtra {
    /// Downstream publish URL, stamped when the status becomes `posted`.
    pub external_publish_url: Option<String>,
}

/// One append-only audit record of a manual operator action.
#[derive(Debug, Clone, Serialize)]
pub struct ItemAction {
    pub id: String,
    pub item_id: String,
    pub action_type: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Manual operator actions accepted at the review surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    PostTwitter,
    Delete,
    Archive,
    Approve,
    Reject,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostTwitter => "post_twitter",
            Self::Delete => "delete",
            Self::Archive => "archive",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Status an item moves to when this action is applied.
    pub fn target_status(&self) -> ItemStatus {
        match self {
            Self::PostTwitter => ItemStatus::Posted,
            Self::Delete => ItemStatus::Deleted,
            Self::Archive => ItemStatus::Archived,
            Self::Approve => ItemStatus::Approved,
            Self::Reject => ItemStatus::Rejected,
        }
    }
}

/// Aggregates over a trailing window, for the review dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyticsReport {
    pub items_by_status: BTreeMap<String, i64>,
    pub items_by_source: BTreeMap<String, i64>,
    pub daily_items: BTreeMap<String, i64>,
    pub actions_by_type: BTreeMap<String, i64>,
    pub avg_quality: f64,
    pub avg_bias: f64,
    pub total_items: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            ItemStatus::Pending,
            ItemStatus::Approved,
            ItemStatus::Posted,
            ItemStatus::PublishFailed,
            ItemStatus::Rejected,
            ItemStatus::Archived,
            ItemStatus::Deleted,
            ItemStatus::Processed,
        ] {
            assert_eq!(ItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItemStatus::parse("bogus"), None);
    }

    #[test]
    fn action_types_map_to_statuses() {
        assert_eq!(ActionType::PostTwitter.target_status(), ItemStatus::Posted);
        assert_eq!(ActionType::Delete.target_status(), ItemStatus::Deleted);
        assert_eq!(ActionType::Archive.target_status(), ItemStatus::Archived);
        assert_eq!(ActionType::Approve.target_status(), ItemStatus::Approved);
        assert_eq!(ActionType::Reject.target_status(), ItemStatus::Rejected);
    }

    #[test]
    fn action_type_deserializes_from_snake_case() {
        let action: ActionType = serde_json::from_str("\"post_twitter\"").unwrap();
        assert_eq!(action, ActionType::PostTwitter);
    }
}
