use crate::{
    AppState,
    handlers::{dashboard, uploads},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Dashboard Router Module
///
/// Authenticated helpers used only by the admin dashboard, plus the health probe.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /uploads/presigned
        // Short-lived (10-minute) PUT URL for a project or client image.
        .route("/uploads/presigned", post(uploads::get_presigned_url))
        .route("/dashboard/stats", get(dashboard::get_dashboard_stats))
}
