use axum::{
    extract::State,
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, ledger, middleware::metrics_middleware, upload, videos};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Videos
        .route("/videos/pending", get(videos::list_pending))
        .route("/videos/uploaded", get(videos::list_uploaded))
        .route("/videos/stats", get(videos::get_stats))
        // Runs
        .route("/upload/start", post(upload::start_upload))
        .route("/upload/status", get(upload::get_status))
        // Ledger drift
        .route("/ledger/reconcile", get(ledger::reconcile))
        .route("/ledger/repair", post(ledger::repair));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /metrics
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
