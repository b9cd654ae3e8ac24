//! libSQL backend — async `ItemStore` implementation.
//!
//! Local file or in-memory databases via libsql's native async API.
//! All timestamps are stored as RFC 3339 text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::model::{
    AnalyticsReport, CandidateItem, Classification, InsertOutcome, ItemStatus, MediaKind, NewItem,
    TransitionExtra,
};
use crate::store::traits::ItemStore;

/// Hard cap on list pagination.
const MAX_LIST_LIMIT: usize = 100;

/// Hard cap on the analytics window, in days.
const MAX_ANALYTICS_DAYS: i64 = 30;

/// Retention floor, in days. Sweeps never archive anything younger.
const MIN_RETENTION_DAYS: i64 = 7;

/// libSQL item store backend.
///
/// Stores a single connection reused for all operations;
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Item store opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to create in-memory db: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Backdate a row's creation time. Test-only escape hatch for
    /// exercising the retention sweep.
    #[cfg(test)]
    pub(crate) async fn backdate_item(&self, id: &str, created_at: DateTime<Utc>) {
        self.conn
            .execute(
                "UPDATE items SET created_at = ?1 WHERE id = ?2",
                params![created_at.to_rfc3339(), id],
            )
            .await
            .unwrap();
    }
}

// ── Helper functions ────────────────────────────────────────────────

const ITEM_COLUMNS: &str = "id, external_id, source_name, sender_name, raw_text, rewritten_text, \
     media_kind, media_ref, classification, quality_score, bias_score, status, \
     content_fingerprint, similarity_fingerprint, priority, source_url, \
     external_publish_url, created_at, updated_at, posted_at";

/// Parse an RFC 3339 or SQLite datetime string into `DateTime<Utc>`.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to a libsql value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

fn row_to_item(row: &libsql::Row) -> Result<CandidateItem, libsql::Error> {
    // NULL columns come back as a get error; treat that as None.
    let rewritten_text: Option<String> = row.get(5).ok();
    let media_ref: Option<String> = row.get(7).ok();
    let source_url: Option<String> = row.get(15).ok();
    let publish_url: Option<String> = row.get(16).ok();
    let posted_at: Option<String> = row.get(19).ok();

    let media_kind_str: String = row.get(6)?;
    let classification_str: String = row.get(8)?;
    let status_str: String = row.get(11)?;
    let created_str: String = row.get(17)?;
    let updated_str: String = row.get(18)?;

    Ok(CandidateItem {
        id: row.get(0)?,
        external_id: row.get(1)?,
        source_name: row.get(2)?,
        sender_name: row.get(3)?,
        raw_text: row.get(4)?,
        rewritten_text,
        media_kind: MediaKind::parse(&media_kind_str),
        media_ref,
        classification: Classification::parse(&classification_str),
        quality_score: row.get(9)?,
        bias_score: row.get(10)?,
        status: ItemStatus::parse(&status_str).unwrap_or(ItemStatus::Pending),
        content_fingerprint: row.get(12)?,
        similarity_fingerprint: row.get(13)?,
        priority: row.get(14)?,
        source_url,
        external_publish_url: publish_url,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
        posted_at: posted_at.map(|s| parse_datetime(&s)),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl ItemStore for LibSqlBackend {
    async fn insert(&self, item: NewItem) -> Result<InsertOutcome, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // INSERT OR IGNORE + affected-row check makes the unique-key
        // collision a reported no-op instead of an error.
        let affected = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO items (
                    id, external_id, source_name, sender_name, raw_text, rewritten_text,
                    media_kind, media_ref, classification, quality_score, bias_score, status,
                    content_fingerprint, similarity_fingerprint, priority, source_url,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
                params![
                    id.clone(),
                    item.external_id.clone(),
                    item.source_name,
                    item.sender_name,
                    item.raw_text,
                    opt_text(item.rewritten_text.as_deref()),
                    item.media_kind.as_str(),
                    opt_text(item.media_ref.as_deref()),
                    item.classification.as_str(),
                    item.quality_score,
                    item.bias_score,
                    item.status.as_str(),
                    item.content_fingerprint,
                    item.similarity_fingerprint,
                    item.priority,
                    opt_text(item.source_url.as_deref()),
                    now,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert item: {e}")))?;

        if affected == 0 {
            debug!(external_id = %item.external_id, "Item already exists, insert is a no-op");
            return Ok(InsertOutcome::AlreadyExists);
        }

        debug!(id = %id, external_id = %item.external_id, "Item inserted");
        Ok(InsertOutcome::Inserted(id))
    }

    async fn get_item(&self, id: &str) -> Result<Option<CandidateItem>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_item: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_item row: {e}")))?
        {
            Some(row) => Ok(Some(
                row_to_item(&row).map_err(|e| DatabaseError::Query(format!("decode item: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<CandidateItem>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE external_id = ?1"),
                params![external_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_by_external_id: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_by_external_id row: {e}")))?
        {
            Some(row) => Ok(Some(
                row_to_item(&row).map_err(|e| DatabaseError::Query(format!("decode item: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    async fn content_fingerprint_exists(&self, fingerprint: &str) -> Result<bool, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM items
                 WHERE content_fingerprint = ?1 AND status != 'deleted'",
                params![fingerprint],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("fingerprint_exists: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("fingerprint_exists row: {e}")))?
        {
            Some(row) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("decode count: {e}")))?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    async fn list_items(
        &self,
        status: Option<ItemStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CandidateItem>, DatabaseError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT) as i64;

        let mut rows = match status {
            Some(status) => self
                .conn()
                .query(
                    &format!(
                        "SELECT {ITEM_COLUMNS} FROM items WHERE status = ?1
                         ORDER BY created_at DESC LIMIT ?2 OFFSET ?3"
                    ),
                    params![status.as_str(), limit, offset as i64],
                )
                .await,
            None => self
                .conn()
                .query(
                    &format!(
                        "SELECT {ITEM_COLUMNS} FROM items
                         ORDER BY created_at DESC LIMIT ?1 OFFSET ?2"
                    ),
                    params![limit, offset as i64],
                )
                .await,
        }
        .map_err(|e| DatabaseError::Query(format!("list_items: {e}")))?;

        let mut items = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_item(&row) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping undecodable item row: {e}"),
            }
        }
        Ok(items)
    }

    async fn transition(
        &self,
        id: &str,
        status: ItemStatus,
        extra: TransitionExtra,
    ) -> Result<bool, DatabaseError> {
        let now = Utc::now().to_rfc3339();

        let affected = if status == ItemStatus::Posted {
            self.conn()
                .execute(
                    "UPDATE items
                     SET status = ?1, updated_at = ?2, posted_at = ?2,
                         external_publish_url = COALESCE(?3, external_publish_url)
                     WHERE id = ?4",
                    params![
                        status.as_str(),
                        now,
                        opt_text(extra.external_publish_url.as_deref()),
                        id,
                    ],
                )
                .await
        } else {
            self.conn()
                .execute(
                    "UPDATE items SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.as_str(), now, id],
                )
                .await
        }
        .map_err(|e| DatabaseError::Query(format!("transition: {e}")))?;

        if affected == 0 {
            debug!(id = id, status = status.as_str(), "Transition no-op: unknown item");
            return Ok(false);
        }

        debug!(id = id, status = status.as_str(), "Item status updated");
        Ok(true)
    }

    async fn record_action(
        &self,
        item_id: &str,
        action_type: &str,
        note: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO item_actions (id, item_id, action_type, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, item_id, action_type, opt_text(note), now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_action: {e}")))?;

        debug!(item_id = item_id, action = action_type, "Operator action recorded");
        Ok(())
    }

    async fn status_counts(&self) -> Result<Vec<(String, i64)>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT status, COUNT(*) FROM items GROUP BY status ORDER BY status",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("status_counts: {e}")))?;

        let mut counts = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let status: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("decode status: {e}")))?;
            let count: i64 = row
                .get(1)
                .map_err(|e| DatabaseError::Query(format!("decode count: {e}")))?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    async fn analytics(&self, days: i64) -> Result<AnalyticsReport, DatabaseError> {
        let days = days.clamp(1, MAX_ANALYTICS_DAYS);
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let mut report = AnalyticsReport::default();

        let mut rows = self
            .conn()
            .query(
                "SELECT status, COUNT(*) FROM items WHERE created_at >= ?1 GROUP BY status",
                params![cutoff.clone()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("analytics status: {e}")))?;
        while let Ok(Some(row)) = rows.next().await {
            let key: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            report.items_by_status.insert(key, count);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT source_name, COUNT(*) FROM items
                 WHERE created_at >= ?1 GROUP BY source_name",
                params![cutoff.clone()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("analytics source: {e}")))?;
        while let Ok(Some(row)) = rows.next().await {
            let key: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            report.items_by_source.insert(key, count);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT DATE(created_at), COUNT(*) FROM items
                 WHERE created_at >= ?1 GROUP BY DATE(created_at)",
                params![cutoff.clone()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("analytics daily: {e}")))?;
        while let Ok(Some(row)) = rows.next().await {
            let key: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            report.daily_items.insert(key, count);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT action_type, COUNT(*) FROM item_actions
                 WHERE created_at >= ?1 GROUP BY action_type",
                params![cutoff.clone()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("analytics actions: {e}")))?;
        while let Ok(Some(row)) = rows.next().await {
            let key: String = row.get(0).unwrap_or_default();
            let count: i64 = row.get(1).unwrap_or(0);
            report.actions_by_type.insert(key, count);
        }

        let mut rows = self
            .conn()
            .query(
                "SELECT COALESCE(AVG(quality_score), 0), COALESCE(AVG(bias_score), 0), COUNT(*)
                 FROM items WHERE created_at >= ?1",
                params![cutoff],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("analytics averages: {e}")))?;
        if let Ok(Some(row)) = rows.next().await {
            report.avg_quality = row.get(0).unwrap_or(0.0);
            report.avg_bias = row.get(1).unwrap_or(0.0);
            report.total_items = row.get(2).unwrap_or(0);
        }

        Ok(report)
    }

    async fn retention_sweep(&self, days: i64) -> Result<u64, DatabaseError> {
        let days = days.max(MIN_RETENTION_DAYS);
        let cutoff = (Utc::now() - Duration::days(days)).to_rfc3339();
        let now = Utc::now().to_rfc3339();

        let archived = self
            .conn()
            .execute(
                "UPDATE items SET status = 'archived', updated_at = ?1
                 WHERE created_at < ?2 AND status NOT IN ('posted', 'pending')",
                params![now, cutoff],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("retention_sweep: {e}")))?;

        info!(archived, days, "Retention sweep complete");
        Ok(archived)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn sample_item(external_id: &str) -> NewItem {
        NewItem {
            external_id: external_id.to_string(),
            source_name: "worldnews".to_string(),
            sender_name: "World News".to_string(),
            raw_text: "Breaking: government officials confirm ceasefire talks".to_string(),
            rewritten_text: Some("Officials confirm ceasefire talks.".to_string()),
            media_kind: MediaKind::None,
            media_ref: None,
            classification: Classification::Geopolitical,
            quality_score: 0.8,
            bias_score: 0.0,
            status: ItemStatus::Pending,
            content_fingerprint: format!("fp-{external_id}"),
            similarity_fingerprint: format!("sim-{external_id}"),
            priority: 1,
            source_url: Some(format!("https://t.me/worldnews/{external_id}")),
        }
    }

    #[tokio::test]
    async fn insert_and_get_by_external_id() {
        let store = test_store().await;
        let outcome = store.insert(sample_item("worldnews_1")).await.unwrap();
        let id = outcome.item_id().unwrap().to_string();

        let loaded = store
            .get_by_external_id("worldnews_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.source_name, "worldnews");
        assert_eq!(loaded.status, ItemStatus::Pending);
        assert_eq!(loaded.classification, Classification::Geopolitical);
        assert!(loaded.posted_at.is_none());
        assert_eq!(
            loaded.rewritten_text.as_deref(),
            Some("Officials confirm ceasefire talks.")
        );
    }

    #[tokio::test]
    async fn insert_is_idempotent_on_external_id() {
        let store = test_store().await;
        let first = store.insert(sample_item("dup_1")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(_)));

        let second = store.insert(sample_item("dup_1")).await.unwrap();
        assert_eq!(second, InsertOutcome::AlreadyExists);

        // Exactly one row stored.
        let items = store.list_items(None, 100, 0).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn transition_to_posted_stamps_timestamp_and_url() {
        let store = test_store().await;
        let id = store
            .insert(sample_item("worldnews_2"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();

        let ok = store
            .transition(
                &id,
                ItemStatus::Posted,
                TransitionExtra {
                    external_publish_url: Some("https://t.me/relay/99".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(ok);

        let loaded = store.get_item(&id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ItemStatus::Posted);
        assert!(loaded.posted_at.is_some());
        assert_eq!(
            loaded.external_publish_url.as_deref(),
            Some("https://t.me/relay/99")
        );
    }

    #[tokio::test]
    async fn transition_unknown_id_is_a_reported_noop() {
        let store = test_store().await;
        let ok = store
            .transition("no-such-id", ItemStatus::Deleted, TransitionExtra::default())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn fingerprint_lookup_ignores_deleted_rows() {
        let store = test_store().await;
        let id = store
            .insert(sample_item("worldnews_3"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();

        assert!(store
            .content_fingerprint_exists("fp-worldnews_3")
            .await
            .unwrap());
        assert!(!store.content_fingerprint_exists("fp-other").await.unwrap());

        store
            .transition(&id, ItemStatus::Deleted, TransitionExtra::default())
            .await
            .unwrap();
        assert!(!store
            .content_fingerprint_exists("fp-worldnews_3")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn list_items_filters_by_status_and_clamps_limit() {
        let store = test_store().await;
        for i in 0..3 {
            store.insert(sample_item(&format!("m_{i}"))).await.unwrap();
        }
        let id = store
            .get_by_external_id("m_0")
            .await
            .unwrap()
            .unwrap()
            .id;
        store
            .transition(&id, ItemStatus::Rejected, TransitionExtra::default())
            .await
            .unwrap();

        let pending = store
            .list_items(Some(ItemStatus::Pending), 50, 0)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let rejected = store
            .list_items(Some(ItemStatus::Rejected), 50, 0)
            .await
            .unwrap();
        assert_eq!(rejected.len(), 1);

        // limit of 0 is clamped up to 1, not treated as "everything"
        let clamped = store.list_items(None, 0, 0).await.unwrap();
        assert_eq!(clamped.len(), 1);
    }

    #[tokio::test]
    async fn record_action_appends() {
        let store = test_store().await;
        let id = store
            .insert(sample_item("worldnews_4"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();

        store
            .record_action(&id, "approve", Some("looks good"))
            .await
            .unwrap();
        store.record_action(&id, "reject", None).await.unwrap();

        let report = store.analytics(7).await.unwrap();
        assert_eq!(report.actions_by_type.get("approve"), Some(&1));
        assert_eq!(report.actions_by_type.get("reject"), Some(&1));
    }

    #[tokio::test]
    async fn analytics_aggregates_by_status_and_source() {
        let store = test_store().await;
        store.insert(sample_item("a_1")).await.unwrap();
        let id = store
            .insert(sample_item("a_2"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();
        store
            .transition(&id, ItemStatus::Rejected, TransitionExtra::default())
            .await
            .unwrap();

        let report = store.analytics(7).await.unwrap();
        assert_eq!(report.total_items, 2);
        assert_eq!(report.items_by_status.get("pending"), Some(&1));
        assert_eq!(report.items_by_status.get("rejected"), Some(&1));
        assert_eq!(report.items_by_source.get("worldnews"), Some(&2));
        assert!(report.avg_quality > 0.0);
    }

    #[tokio::test]
    async fn retention_sweep_archives_old_non_critical_rows() {
        let store = test_store().await;
        let old_rejected = store
            .insert(sample_item("old_rejected"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();
        let old_pending = store
            .insert(sample_item("old_pending"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();
        let fresh = store
            .insert(sample_item("fresh_rejected"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();

        store
            .transition(&old_rejected, ItemStatus::Rejected, TransitionExtra::default())
            .await
            .unwrap();
        store
            .transition(&fresh, ItemStatus::Rejected, TransitionExtra::default())
            .await
            .unwrap();

        let sixty_days_ago = Utc::now() - Duration::days(60);
        store.backdate_item(&old_rejected, sixty_days_ago).await;
        store.backdate_item(&old_pending, sixty_days_ago).await;

        let archived = store.retention_sweep(30).await.unwrap();
        assert_eq!(archived, 1);

        // Old rejected row archived; pending survives regardless of age;
        // fresh rejected row untouched; total row count unchanged.
        assert_eq!(
            store.get_item(&old_rejected).await.unwrap().unwrap().status,
            ItemStatus::Archived
        );
        assert_eq!(
            store.get_item(&old_pending).await.unwrap().unwrap().status,
            ItemStatus::Pending
        );
        assert_eq!(
            store.get_item(&fresh).await.unwrap().unwrap().status,
            ItemStatus::Rejected
        );
        assert_eq!(store.list_items(None, 100, 0).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn retention_sweep_enforces_floor() {
        let store = test_store().await;
        let id = store
            .insert(sample_item("recent"))
            .await
            .unwrap()
            .item_id()
            .unwrap()
            .to_string();
        store
            .transition(&id, ItemStatus::Rejected, TransitionExtra::default())
            .await
            .unwrap();
        store
            .backdate_item(&id, Utc::now() - Duration::days(5))
            .await;

        // Requesting a 1-day sweep still floors at 7 days.
        let archived = store.retention_sweep(1).await.unwrap();
        assert_eq!(archived, 0);
    }
}
