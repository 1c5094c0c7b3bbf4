// Resume/job matching: skill extraction, fit scoring, cover letters.
// LLM calls go through llm_client; every operation has a non-LLM fallback.

pub mod cover_letter;
pub mod fit_scoring;
pub mod handlers;
pub mod prompts;
pub mod skills;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::fit_scoring::{MatchReport, MatchScorer};
use crate::models::job::{Job, JobFilter, JobPatch};
use crate::models::resume::Resume;
use crate::storage::Storage;

#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job_id: Uuid,
    pub title: String,
    pub company: String,
    pub report: MatchReport,
}

/// Scores one job and persists the score on it.
pub async fn score_and_store(
    storage: &dyn Storage,
    scorer: &dyn MatchScorer,
    resume: &Resume,
    job: &Job,
) -> Result<(Job, MatchReport), AppError> {
    let report = scorer.score(resume, job).await?;
    let job = storage
        .update_job(
            job.id,
            JobPatch {
                match_score: Some(report.score),
                ..Default::default()
            },
        )
        .await?;
    Ok((job, report))
}

/// Scores the given jobs in order. A job that fails to score is logged and skipped.
pub async fn score_jobs(
    storage: &dyn Storage,
    scorer: &dyn MatchScorer,
    resume: &Resume,
    jobs: &[Job],
) -> Vec<JobMatch> {
    let mut matches = Vec::with_capacity(jobs.len());
    for job in jobs {
        match score_and_store(storage, scorer, resume, job).await {
            Ok((job, report)) => matches.push(JobMatch {
                job_id: job.id,
                title: job.title,
                company: job.company,
                report,
            }),
            Err(e) => warn!(job_id = %job.id, error = %e, "Failed to score job"),
        }
    }
    matches
}

/// Scores every job that has no score yet.
pub async fn score_all_jobs(
    storage: &dyn Storage,
    scorer: &dyn MatchScorer,
    resume: &Resume,
) -> Result<Vec<JobMatch>, AppError> {
    let unscored: Vec<Job> = storage
        .list_jobs(&JobFilter::default())
        .await?
        .into_iter()
        .filter(|job| job.match_score.is_none())
        .collect();

    let matches = score_jobs(storage, scorer, resume, &unscored).await;
    info!(
        resume_id = %resume.id,
        candidates = unscored.len(),
        scored = matches.len(),
        "Batch scoring finished"
    );
    Ok(matches)
}
