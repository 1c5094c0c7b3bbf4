//! Axum route handlers for matching, cover letters and LLM status.

use axum::{
    extract::{Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ChainStatus;
use crate::matching::cover_letter::{generate_cover_letter, CoverLetter, CoverLetterTone};
use crate::matching::fit_scoring::MatchReport;
use crate::matching::{score_all_jobs, score_and_store, JobMatch};
use crate::models::job::Job;
use crate::models::resume::Resume;
use crate::routes::optional_json;
use crate::state::AppState;
use crate::storage::{job_not_found, resume_not_found, Storage};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MatchRequest {
    /// Defaults to the default resume.
    pub resume_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub job: Job,
    pub resume_id: Uuid,
    pub report: MatchReport,
}

#[derive(Debug, Serialize)]
pub struct MatchAllResponse {
    pub resume_id: Uuid,
    pub scored: usize,
    pub matches: Vec<JobMatch>,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub job_id: Uuid,
    pub resume_id: Option<Uuid>,
    #[serde(default)]
    pub tone: CoverLetterTone,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub job_id: Uuid,
    pub resume_id: Uuid,
    #[serde(flatten)]
    pub letter: CoverLetter,
}

/// Looks up `resume_id`, or the default resume when none is given.
pub(crate) async fn resolve_resume(
    storage: &dyn Storage,
    resume_id: Option<Uuid>,
) -> Result<Resume, AppError> {
    match resume_id {
        Some(id) => storage
            .get_resume(id)
            .await?
            .ok_or_else(|| resume_not_found(id)),
        None => storage.get_default_resume().await?.ok_or_else(|| {
            AppError::UnprocessableEntity(
                "No resume given and no default resume is set".to_string(),
            )
        }),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/jobs/:id/match
///
/// Scores the job against a resume and stores the score on the job.
pub async fn handle_match_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<MatchResponse>, AppError> {
    let request: MatchRequest = optional_json(&body)?;

    let job = state
        .storage
        .get_job(job_id)
        .await?
        .ok_or_else(|| job_not_found(job_id))?;
    let resume = resolve_resume(state.storage.as_ref(), request.resume_id).await?;

    let (job, report) =
        score_and_store(state.storage.as_ref(), state.matcher.as_ref(), &resume, &job).await?;

    Ok(Json(MatchResponse {
        job,
        resume_id: resume.id,
        report,
    }))
}

/// POST /api/jobs/match-all
///
/// Scores every job that has no score yet.
pub async fn handle_match_all(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MatchAllResponse>, AppError> {
    let request: MatchRequest = optional_json(&body)?;
    let resume = resolve_resume(state.storage.as_ref(), request.resume_id).await?;

    let matches = score_all_jobs(state.storage.as_ref(), state.matcher.as_ref(), &resume).await?;

    Ok(Json(MatchAllResponse {
        resume_id: resume.id,
        scored: matches.len(),
        matches,
    }))
}

/// POST /api/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let job = state
        .storage
        .get_job(request.job_id)
        .await?
        .ok_or_else(|| job_not_found(request.job_id))?;
    let resume = resolve_resume(state.storage.as_ref(), request.resume_id).await?;

    let letter = generate_cover_letter(&state.llm, &resume, &job, request.tone).await;

    Ok(Json(CoverLetterResponse {
        job_id: job.id,
        resume_id: resume.id,
        letter,
    }))
}

/// GET /api/llm/status
pub async fn handle_llm_status(State(state): State<AppState>) -> Json<ChainStatus> {
    Json(state.llm.status().await)
}
