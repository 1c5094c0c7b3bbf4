//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::{prepare_application, CreateApplicationRequest};
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch};
use crate::state::AppState;
use crate::storage::application_not_found;

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    pub job_id: Option<Uuid>,
}

/// GET /api/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationQuery>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.storage.list_applications(query.job_id).await?))
}

/// POST /api/applications
///
/// Creating with status `applied` also marks the job applied.
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let new_app = prepare_application(state.storage.as_ref(), &state.llm, request).await?;
    let application = state.storage.create_application(new_app).await?;
    tracing::info!(
        application_id = %application.id,
        job_id = %application.job_id,
        status = application.status.as_str(),
        "Application created"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let application = state
        .storage
        .get_application(application_id)
        .await?
        .ok_or_else(|| application_not_found(application_id))?;
    Ok(Json(application))
}

/// PATCH /api/applications/:id
///
/// A submitted application cannot go back to `draft` (400).
pub async fn handle_update_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<Application>, AppError> {
    Ok(Json(
        state
            .storage
            .update_application(application_id, patch)
            .await?,
    ))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_application(application_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
