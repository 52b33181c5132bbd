//! Video listing API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vidsync_core::PendingItem;

use super::handlers::coordinator_error;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PendingParams {
    /// Stop after this many media-bearing items.
    #[serde(default)]
    pub max_posts: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub posts: Vec<PendingItem>,
    pub bucket: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedResponse {
    pub count: usize,
    pub uploaded_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_uploaded: usize,
    pub pending_uploads: usize,
    pub bucket: String,
    pub region: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/videos/pending
///
/// Items a run would transfer now. Nothing is downloaded or recorded.
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PendingParams>,
) -> Result<Json<PendingResponse>, impl IntoResponse> {
    let coordinator = state.coordinator();
    match coordinator.pending(params.max_posts).await {
        Ok(posts) => {
            debug!(count = posts.len(), max_posts = ?params.max_posts, "Listed pending items");
            Ok(Json(PendingResponse {
                count: posts.len(),
                posts,
                bucket: coordinator.store().bucket().to_string(),
            }))
        }
        Err(e) => Err(coordinator_error(e)),
    }
}

/// GET /api/v1/videos/uploaded
///
/// Ids recorded in the ledger, in recording order.
pub async fn list_uploaded(State(state): State<Arc<AppState>>) -> Json<UploadedResponse> {
    let uploaded_ids = state.coordinator().ledger().ids();
    Json(UploadedResponse {
        count: uploaded_ids.len(),
        uploaded_ids,
    })
}

/// GET /api/v1/videos/stats
///
/// Counts pending items by enumerating the source, so this is as slow as a
/// full preview.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, impl IntoResponse> {
    let coordinator = state.coordinator();
    match coordinator.pending(None).await {
        Ok(pending) => Ok(Json(StatsResponse {
            total_uploaded: coordinator.ledger().len(),
            pending_uploads: pending.len(),
            bucket: coordinator.store().bucket().to_string(),
            region: state.config().storage.region.clone(),
        })),
        Err(e) => Err(coordinator_error(e)),
    }
}
