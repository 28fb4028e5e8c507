use axum::{Json, extract::State};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::dashboard::model::DashboardStatsResponse;
use crate::modules::dashboard::service::DashboardService;
use crate::state::AppState;

/// Row counts for the admin dashboard
#[instrument(skip(state, _auth))]
pub async fn get_stats(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<DashboardStatsResponse>, AppError> {
    let stats = DashboardService::stats(&state.db).await?;
    Ok(Json(DashboardStatsResponse {
        success: true,
        stats,
    }))
}
