//! Axum route handlers for the scheduler control API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::scheduler::{RunSummary, SchedulerStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// False when the scheduler was already in the requested state.
    pub changed: bool,
    pub status: SchedulerStatus,
}

/// GET /api/scheduler
pub async fn handle_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

/// POST /api/scheduler/start
pub async fn handle_start(State(state): State<AppState>) -> Json<ToggleResponse> {
    let changed = state.scheduler.start();
    Json(ToggleResponse {
        changed,
        status: state.scheduler.status(),
    })
}

/// POST /api/scheduler/stop
pub async fn handle_stop(State(state): State<AppState>) -> Json<ToggleResponse> {
    let changed = state.scheduler.stop();
    Json(ToggleResponse {
        changed,
        status: state.scheduler.status(),
    })
}

/// POST /api/scheduler/run
///
/// Runs a search now. Waits if a scheduled run is in progress.
pub async fn handle_run(State(state): State<AppState>) -> Result<Json<RunSummary>, AppError> {
    Ok(Json(state.scheduler.run_once().await?))
}
