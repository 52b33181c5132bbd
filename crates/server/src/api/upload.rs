//! Transfer run API handlers.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use vidsync_core::{JobStatus, StartOutcome};

use super::handlers::ErrorResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Item cap for this run; falls back to `job.default_max_items`.
    #[serde(default)]
    pub max_posts: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: String,
    pub run_id: Uuid,
    pub max_posts: Option<usize>,
}

/// POST /api/v1/upload/start
///
/// Start a run in the background. The body is optional; an empty body
/// starts an uncapped run (or one capped by the configured default).
pub async fn start_upload(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let request: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Invalid request body: {}", e),
                    }),
                )
                    .into_response()
            }
        }
    };

    let max_posts = request.max_posts.or(state.config().job.default_max_items);

    match state.coordinator().start(max_posts) {
        StartOutcome::Accepted { run_id } => {
            info!(run_id = %run_id, max_posts = ?max_posts, "Run started via API");
            (
                StatusCode::ACCEPTED,
                Json(StartResponse {
                    message: "Upload process started".to_string(),
                    run_id,
                    max_posts,
                }),
            )
                .into_response()
        }
        StartOutcome::AlreadyRunning => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Upload process is already running".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /api/v1/upload/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<JobStatus> {
    Json(state.coordinator().status())
}
