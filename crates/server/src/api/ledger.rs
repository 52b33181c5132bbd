//! Ledger reconciliation API handlers.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use vidsync_core::{ReconcileReport, RepairAction, RepairReport};

use super::handlers::coordinator_error;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub consistent: bool,
    #[serde(flatten)]
    pub report: ReconcileReport,
}

#[derive(Debug, Deserialize)]
pub struct RepairRequest {
    pub action: RepairAction,
}

/// GET /api/v1/ledger/reconcile
///
/// Compare the ledger against a fresh storage listing. Read-only.
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReconcileResponse>, impl IntoResponse> {
    match state.coordinator().reconcile().await {
        Ok(report) => Ok(Json(ReconcileResponse {
            consistent: report.is_consistent(),
            report,
        })),
        Err(e) => Err(coordinator_error(e)),
    }
}

/// POST /api/v1/ledger/repair
///
/// Back the ledger up to `ledger.backup_path`, then repair it. Refused
/// with 409 while a run is in progress.
pub async fn repair(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RepairRequest>,
) -> Result<Json<RepairReport>, impl IntoResponse> {
    let backup_path = &state.config().ledger.backup_path;
    match state.coordinator().repair(body.action, backup_path).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => Err(coordinator_error(e)),
    }
}
