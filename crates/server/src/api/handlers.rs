use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use vidsync_core::{Config, CoordinatorError};

use crate::state::AppState;

const SERVICE_NAME: &str = "vidsync";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a coordinator failure to an HTTP error.
///
/// Upstream failures (content source, object storage) are 502; a busy
/// coordinator is 409.
pub fn coordinator_error(error: CoordinatorError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        CoordinatorError::Busy => StatusCode::CONFLICT,
        CoordinatorError::Source(_) | CoordinatorError::Storage(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
    })
}

/// GET /api/v1/config
///
/// The effective configuration. Credentials never live in it; AWS
/// credentials come from the provider chain.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}
