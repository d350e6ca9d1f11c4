use axum::{Json, extract::State};

use crate::{AppState, auth::AuthUser, error::AppResult, models::DashboardStats};

/// get_dashboard_stats
///
/// [Authenticated Route] Counters for the dashboard landing tab.
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_dashboard_stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.repo.get_stats().await?))
}
