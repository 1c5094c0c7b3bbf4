use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::DashboardStats;
use crate::state::AppState;

/// GET /api/stats
/// Counts for the dashboard landing page.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.storage.stats().await?))
}
