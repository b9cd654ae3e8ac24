//! Review API.
//!
//! Small REST surface over the item store: list and inspect items, apply
//! operator actions, read analytics. All error responses share one shape,
//! `{"success": false, "error": "..."}`.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::channels::telegram::tweet_intent_url;
use crate::error::DatabaseError;
use crate::store::{ActionType, ItemStatus, ItemStore, TransitionExtra};

const DEFAULT_LIST_LIMIT: usize = 50;
const DEFAULT_ANALYTICS_DAYS: i64 = 7;

/// Shared state for the review routes.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ItemStore>,
    pub retention_days: i64,
}

/// API failure carrying the HTTP status to report.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

// ── Request shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ActionRequest {
    action: ActionType,
    note: Option<String>,
    /// For `post_twitter`: the URL of the published tweet, recorded on
    /// the item as its external publish URL.
    twitter_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchActionRequest {
    action: ActionType,
    item_ids: Vec<String>,
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CleanupRequest {
    days: Option<i64>,
}

// ── Core operations ─────────────────────────────────────────────────

async fn list_items_op(
    state: &ApiState,
    status: Option<&str>,
    limit: usize,
    offset: usize,
) -> Result<Value, ApiError> {
    let status = match status {
        Some(raw) => Some(
            ItemStatus::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown status: {raw}")))?,
        ),
        None => None,
    };

    let items = state.store.list_items(status, limit, offset).await?;
    Ok(json!({
        "success": true,
        "count": items.len(),
        "items": items,
    }))
}

async fn get_item_op(state: &ApiState, id: &str) -> Result<Value, ApiError> {
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No item with id {id}")))?;
    Ok(json!({ "success": true, "item": item }))
}

/// Apply one operator action: transition the item, append an audit row.
async fn apply_action_op(
    state: &ApiState,
    id: &str,
    action: ActionType,
    note: Option<&str>,
    twitter_url: Option<&str>,
) -> Result<Value, ApiError> {
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No item with id {id}")))?;

    let target = action.target_status();
    let extra = if action == ActionType::PostTwitter {
        TransitionExtra {
            external_publish_url: twitter_url.map(str::to_string),
        }
    } else {
        TransitionExtra::default()
    };
    state.store.transition(id, target, extra).await?;
    state.store.record_action(id, action.as_str(), note).await?;

    info!(item_id = id, action = action.as_str(), "Operator action applied");

    let mut response = json!({
        "success": true,
        "item_id": id,
        "action": action.as_str(),
        "new_status": target.as_str(),
    });
    // post_twitter hands back a prefilled compose link; the relay never
    // posts to X itself.
    if action == ActionType::PostTwitter {
        let text = item.rewritten_text.as_deref().unwrap_or(&item.raw_text);
        if let Some(url) = tweet_intent_url(text) {
            response["tweet_intent_url"] = Value::String(url);
        }
    }
    Ok(response)
}

async fn batch_action_op(
    state: &ApiState,
    request: &BatchActionRequest,
) -> Result<Value, ApiError> {
    if request.item_ids.is_empty() {
        return Err(ApiError::bad_request("item_ids must not be empty"));
    }

    let mut results = Vec::with_capacity(request.item_ids.len());
    let mut succeeded = 0usize;
    for id in &request.item_ids {
        match apply_action_op(state, id, request.action, request.note.as_deref(), None).await {
            Ok(_) => {
                succeeded += 1;
                results.push(json!({ "item_id": id, "success": true }));
            }
            Err(e) => {
                results.push(json!({
                    "item_id": id,
                    "success": false,
                    "error": e.message,
                }));
            }
        }
    }

    Ok(json!({
        "success": true,
        "total": request.item_ids.len(),
        "succeeded": succeeded,
        "results": results,
    }))
}

async fn analytics_op(state: &ApiState, days: i64) -> Result<Value, ApiError> {
    let report = state.store.analytics(days).await?;
    Ok(json!({ "success": true, "days": days.clamp(1, 30), "analytics": report }))
}

/// Whole-table status counts plus derived rates.
async fn stats_op(state: &ApiState) -> Result<Value, ApiError> {
    let counts = state.store.status_counts().await?;
    let total: i64 = counts.iter().map(|(_, c)| c).sum();
    let count_of = |status: ItemStatus| {
        counts
            .iter()
            .find(|(s, _)| s == status.as_str())
            .map(|(_, c)| *c)
            .unwrap_or(0)
    };

    let posted = count_of(ItemStatus::Posted);
    let rejected = count_of(ItemStatus::Rejected);
    let rate = |n: i64| {
        if total > 0 {
            n as f64 / total as f64
        } else {
            0.0
        }
    };

    let by_status: serde_json::Map<String, Value> = counts
        .into_iter()
        .map(|(status, count)| (status, Value::from(count)))
        .collect();

    Ok(json!({
        "success": true,
        "total_items": total,
        "by_status": by_status,
        "posted_rate": rate(posted),
        "rejected_rate": rate(rejected),
    }))
}

async fn cleanup_op(state: &ApiState, days: Option<i64>) -> Result<Value, ApiError> {
    let days = days.unwrap_or(state.retention_days);
    let archived = state.store.retention_sweep(days).await?;
    Ok(json!({ "success": true, "archived": archived }))
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

async fn list_items(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    list_items_op(
        &state,
        query.status.as_deref(),
        query.limit.unwrap_or(DEFAULT_LIST_LIMIT),
        query.offset.unwrap_or(0),
    )
    .await
    .map(Json)
}

async fn get_item(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    get_item_op(&state, &id).await.map(Json)
}

async fn item_action(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<Value>, ApiError> {
    apply_action_op(
        &state,
        &id,
        request.action,
        request.note.as_deref(),
        request.twitter_url.as_deref(),
    )
    .await
    .map(Json)
}

async fn batch_action(
    State(state): State<ApiState>,
    Json(request): Json<BatchActionRequest>,
) -> Result<Json<Value>, ApiError> {
    batch_action_op(&state, &request).await.map(Json)
}

async fn analytics(
    State(state): State<ApiState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, ApiError> {
    analytics_op(&state, query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS))
        .await
        .map(Json)
}

async fn stats(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    stats_op(&state).await.map(Json)
}

async fn cleanup(
    State(state): State<ApiState>,
    Json(request): Json<CleanupRequest>,
) -> Result<Json<Value>, ApiError> {
    cleanup_op(&state, request.days).await.map(Json)
}

/// Build the review router.
pub fn review_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/items", get(list_items))
        .route("/api/items/{id}", get(get_item))
        .route("/api/items/{id}/action", post(item_action))
        .route("/api/items/batch-action", post(batch_action))
        .route("/api/analytics", get(analytics))
        .route("/api/stats", get(stats))
        .route("/api/cleanup", post(cleanup))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Classification, InsertOutcome, LibSqlBackend, MediaKind, NewItem};

    async fn state_with_items(n: usize) -> (ApiState, Vec<String>) {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let mut ids = Vec::new();
        for i in 0..n {
            let outcome = store
                .insert(NewItem {
                    external_id: format!("src_{i}"),
                    source_name: "worldnews".to_string(),
                    sender_name: "World News".to_string(),
                    raw_text: format!("Ceasefire update number {i}"),
                    rewritten_text: Some(format!("Update {i}.")),
                    media_kind: MediaKind::None,
                    media_ref: None,
                    classification: Classification::Geopolitical,
                    quality_score: 0.7,
                    bias_score: 0.0,
                    status: ItemStatus::Pending,
                    content_fingerprint: format!("fp_{i}"),
                    similarity_fingerprint: format!("sim_{i}"),
                    priority: 1,
                    source_url: None,
                })
                .await
                .unwrap();
            match outcome {
                InsertOutcome::Inserted(id) => ids.push(id),
                InsertOutcome::AlreadyExists => unreachable!(),
            }
        }
        (
            ApiState {
                store,
                retention_days: 30,
            },
            ids,
        )
    }

    #[tokio::test]
    async fn list_returns_items_and_count() {
        let (state, _) = state_with_items(3).await;
        let body = list_items_op(&state, None, 50, 0).await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn list_rejects_unknown_status() {
        let (state, _) = state_with_items(1).await;
        let err = list_items_op(&state, Some("bogus"), 50, 0)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_item_404s_on_unknown_id() {
        let (state, _) = state_with_items(1).await;
        let err = get_item_op(&state, "missing").await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn action_transitions_and_audits() {
        let (state, ids) = state_with_items(1).await;
        let body = apply_action_op(&state, &ids[0], ActionType::Approve, Some("ok"), None)
            .await
            .unwrap();
        assert_eq!(body["new_status"], "approved");

        let item = state.store.get_item(&ids[0]).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Approved);

        let report = state.store.analytics(7).await.unwrap();
        assert_eq!(report.actions_by_type.get("approve"), Some(&1));
    }

    #[tokio::test]
    async fn post_twitter_action_returns_intent_link() {
        let (state, ids) = state_with_items(1).await;
        let body = apply_action_op(&state, &ids[0], ActionType::PostTwitter, None, None)
            .await
            .unwrap();
        assert_eq!(body["new_status"], "posted");
        let url = body["tweet_intent_url"].as_str().unwrap();
        assert!(url.starts_with("https://twitter.com/intent/tweet?text="));

        // post_twitter counts as a confirmed publish and stamps posted_at.
        let item = state.store.get_item(&ids[0]).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Posted);
        assert!(item.posted_at.is_some());
    }

    #[tokio::test]
    async fn post_twitter_action_records_submitted_url() {
        let (state, ids) = state_with_items(1).await;
        apply_action_op(
            &state,
            &ids[0],
            ActionType::PostTwitter,
            None,
            Some("https://x.com/relay/status/123"),
        )
        .await
        .unwrap();

        let item = state.store.get_item(&ids[0]).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Posted);
        assert_eq!(
            item.external_publish_url.as_deref(),
            Some("https://x.com/relay/status/123")
        );
    }

    #[tokio::test]
    async fn batch_action_reports_per_item_results() {
        let (state, ids) = state_with_items(2).await;
        let request = BatchActionRequest {
            action: ActionType::Archive,
            item_ids: vec![ids[0].clone(), "missing".to_string(), ids[1].clone()],
            note: None,
        };
        let body = batch_action_op(&state, &request).await.unwrap();
        assert_eq!(body["total"], 3);
        assert_eq!(body["succeeded"], 2);

        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["success"], true);
        assert_eq!(results[1]["success"], false);
        assert_eq!(results[2]["success"], true);
    }

    #[tokio::test]
    async fn batch_action_rejects_empty_id_list() {
        let (state, _) = state_with_items(1).await;
        let request = BatchActionRequest {
            action: ActionType::Archive,
            item_ids: Vec::new(),
            note: None,
        };
        let err = batch_action_op(&state, &request).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_includes_rates() {
        let (state, ids) = state_with_items(4).await;
        apply_action_op(&state, &ids[0], ActionType::PostTwitter, None, None)
            .await
            .unwrap();
        apply_action_op(&state, &ids[1], ActionType::Reject, None, None)
            .await
            .unwrap();

        let body = stats_op(&state).await.unwrap();
        assert_eq!(body["total_items"], 4);
        assert_eq!(body["by_status"]["pending"], 2);
        assert_eq!(body["posted_rate"], 0.25);
        assert_eq!(body["rejected_rate"], 0.25);
    }

    #[tokio::test]
    async fn cleanup_defaults_to_configured_retention() {
        let (state, _) = state_with_items(1).await;
        let body = cleanup_op(&state, None).await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["archived"], 0);
    }

    #[tokio::test]
    async fn analytics_clamps_window() {
        let (state, _) = state_with_items(1).await;
        let body = analytics_op(&state, 400).await.unwrap();
        assert_eq!(body["days"], 30);
        assert_eq!(body["analytics"]["total_items"], 1);
    }
}
