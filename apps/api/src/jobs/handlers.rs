//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::{validate_job_patch, validate_new_job};
use crate::models::job::{Job, JobFilter, JobPatch, JobSource, NewJob};
use crate::scraping::{ingest, ScrapeReport, SearchQuery};
use crate::routes::optional_json;
use crate::state::AppState;
use crate::storage::job_not_found;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Ad-hoc search. Omitted fields come from the saved search preferences.
#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub remote_only: Option<bool>,
    pub limit: Option<usize>,
    pub sources: Option<Vec<JobSource>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub report: ScrapeReport,
    pub new_jobs: usize,
    pub jobs: Vec<Job>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/jobs
///
/// Newest first. Query: status, source, search, min_score.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<Vec<Job>>, AppError> {
    if filter.min_score.is_some_and(|min| min > 100) {
        return Err(AppError::Validation(
            "min_score must be between 0 and 100".to_string(),
        ));
    }
    Ok(Json(state.storage.list_jobs(&filter).await?))
}

/// POST /api/jobs
///
/// Manual entry. A url that is already stored returns the existing job with 200.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(new_job): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let new_job = validate_new_job(new_job)?;
    let inserted = state.storage.create_job(new_job).await?;

    let status = if inserted.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(inserted.into_job())))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = state
        .storage
        .get_job(job_id)
        .await?
        .ok_or_else(|| job_not_found(job_id))?;
    Ok(Json(job))
}

/// PATCH /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<Job>, AppError> {
    validate_job_patch(&patch)?;
    Ok(Json(state.storage.update_job(job_id, patch).await?))
}

/// DELETE /api/jobs/:id
///
/// Also deletes the job's applications.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.storage.delete_job(job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/jobs/search
///
/// Scrapes the requested boards now and stores unseen postings.
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SearchResponse>, AppError> {
    let request: SearchRequest = optional_json(&body)?;
    let prefs = state.storage.get_search_preferences().await?;

    let mut query = SearchQuery::from(&prefs);
    if let Some(keywords) = request.keywords {
        query.keywords = keywords.trim().to_string();
    }
    if let Some(location) = request.location {
        query.location = location.trim().to_string();
    }
    if let Some(remote_only) = request.remote_only {
        query.remote_only = remote_only;
    }
    if let Some(limit) = request.limit {
        query.limit = limit.clamp(1, 100);
    }
    if query.keywords.is_empty() {
        return Err(AppError::Validation("keywords cannot be empty".to_string()));
    }

    let sources = request.sources.unwrap_or(prefs.sources);
    if sources.contains(&JobSource::Manual) {
        return Err(AppError::Validation(
            "'manual' is not a searchable source".to_string(),
        ));
    }

    let mut report = state.scraper.search(&query, &sources).await;
    let scraped = std::mem::take(&mut report.jobs);
    let jobs = ingest(state.storage.as_ref(), scraped).await?;

    Ok(Json(SearchResponse {
        report,
        new_jobs: jobs.len(),
        jobs,
    }))
}
