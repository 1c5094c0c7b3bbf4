// Jobs API: manual entry, triage and on-demand scraping.

pub mod handlers;

use crate::errors::AppError;
use crate::models::job::{JobPatch, NewJob};

/// Trims the required fields and rejects blank ones.
pub fn validate_new_job(mut job: NewJob) -> Result<NewJob, AppError> {
    job.title = job.title.trim().to_string();
    job.company = job.company.trim().to_string();
    job.url = job.url.trim().to_string();

    for (field, value) in [("title", &job.title), ("company", &job.company), ("url", &job.url)] {
        if value.is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }
    if !(job.url.starts_with("http://") || job.url.starts_with("https://")) {
        return Err(AppError::Validation("url must be an http(s) address".to_string()));
    }
    Ok(job)
}

pub fn validate_job_patch(patch: &JobPatch) -> Result<(), AppError> {
    if patch.match_score.is_some_and(|score| score > 100) {
        return Err(AppError::Validation(
            "match_score must be between 0 and 100".to_string(),
        ));
    }
    Ok(())
}
