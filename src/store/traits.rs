//! `ItemStore` — backend-agnostic persistence trait for candidate items.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::store::model::{
    AnalyticsReport, CandidateItem, InsertOutcome, ItemStatus, NewItem, TransitionExtra,
};

/// Persistence surface consumed by the pipeline and the review API.
///
/// The store is the single source of truth for candidate items. Writes are
/// serialized per item by the unique-key insert; running more than one
/// ingester against the same store is unsupported.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item.
    ///
    /// Idempotent on `external_id`: a collision reports
    /// [`InsertOutcome::AlreadyExists`] and leaves the stored row untouched.
    async fn insert(&self, item: NewItem) -> Result<InsertOutcome, DatabaseError>;

    /// Fetch by surrogate id.
    async fn get_item(&self, id: &str) -> Result<Option<CandidateItem>, DatabaseError>;

    /// Fetch by external (source-native) id.
    async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CandidateItem>, DatabaseError>;

    /// Whether a non-deleted item with this content fingerprint exists.
    async fn content_fingerprint_exists(&self, fingerprint: &str) -> Result<bool, DatabaseError>;

    /// List items, newest first, optionally filtered by status.
    ///
    /// `limit` is clamped to 1..=100 by the implementation.
    async fn list_items(
        &self,
        status: Option<ItemStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CandidateItem>, DatabaseError>;

    /// Update an item's status.
    ///
    /// Stamps `posted_at` (and the publish URL from `extra`) when the new
    /// status is `posted`. Returns `false` when the id does not exist; the
    /// store does not validate transition legality.
    async fn transition(
        &self,
        id: &str,
        status: ItemStatus,
        extra: TransitionExtra,
    ) -> Result<bool, DatabaseError>;

    /// Append a manual operator action to the audit log.
    async fn record_action(
        &self,
        item_id: &str,
        action_type: &str,
        note: Option<&str>,
    ) -> Result<(), DatabaseError>;

    /// Counts of items per status across the whole table.
    async fn status_counts(&self) -> Result<Vec<(String, i64)>, DatabaseError>;

    /// Aggregates over the trailing `days` window (clamped to 1..=30).
    async fn analytics(&self, days: i64) -> Result<AnalyticsReport, DatabaseError>;

    /// Move items older than `days` (floored at 7) and not in
    /// {posted, pending} to `archived`. Never deletes rows. Returns the
    /// number of rows archived.
    async fn retention_sweep(&self, days: i64) -> Result<u64, DatabaseError>;
}
