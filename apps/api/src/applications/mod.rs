// Applications API: tracking submissions per job, optional generated cover letter.

pub mod handlers;

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::matching::cover_letter::{generate_cover_letter, CoverLetterTone};
use crate::matching::handlers::resolve_resume;
use crate::models::application::{ApplicationStatus, NewApplication};
use crate::storage::{job_not_found, Storage};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    /// Defaults to the default resume.
    #[serde(default)]
    pub resume_id: Option<Uuid>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub cover_letter: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Generate a cover letter when none is supplied.
    #[serde(default)]
    pub generate_cover_letter: bool,
    #[serde(default)]
    pub tone: CoverLetterTone,
}

/// Resolves the resume and, if asked, writes the cover letter.
pub async fn prepare_application(
    storage: &dyn Storage,
    llm: &LlmClient,
    request: CreateApplicationRequest,
) -> Result<NewApplication, AppError> {
    let job = storage
        .get_job(request.job_id)
        .await?
        .ok_or_else(|| job_not_found(request.job_id))?;
    let resume = resolve_resume(storage, request.resume_id).await?;

    let cover_letter = match request.cover_letter.filter(|c| !c.trim().is_empty()) {
        Some(letter) => Some(letter),
        None if request.generate_cover_letter => {
            let letter = generate_cover_letter(llm, &resume, &job, request.tone).await;
            tracing::info!(job_id = %job.id, source = %letter.source, "Generated cover letter for application");
            Some(letter.content)
        }
        None => None,
    };

    Ok(NewApplication {
        job_id: job.id,
        resume_id: resume.id,
        status: request.status,
        cover_letter,
        notes: request.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::chain;
    use crate::models::job::{JobSource, NewJob};
    use crate::models::resume::NewResume;
    use crate::storage::MemStorage;

    async fn seeded() -> (MemStorage, Uuid, Uuid) {
        let storage = MemStorage::new();
        let job = storage
            .create_job(NewJob {
                title: "Rust Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                description: "Rust and Docker".to_string(),
                url: "https://acme.dev/jobs/1".to_string(),
                source: JobSource::Manual,
                salary: None,
                job_type: None,
                posted_at: None,
            })
            .await
            .unwrap()
            .into_job();
        let resume = storage
            .create_resume(NewResume {
                name: "main".to_string(),
                content: "Rust".to_string(),
                skills: vec![],
                is_default: true,
            })
            .await
            .unwrap();
        (storage, job.id, resume.id)
    }

    fn request(job_id: Uuid) -> CreateApplicationRequest {
        serde_json::from_value(serde_json::json!({ "job_id": job_id })).unwrap()
    }

    #[tokio::test]
    async fn test_default_resume_is_used() {
        let (storage, job_id, resume_id) = seeded().await;
        let new_app = prepare_application(&storage, &chain(&[]), request(job_id))
            .await
            .unwrap();
        assert_eq!(new_app.resume_id, resume_id);
        assert_eq!(new_app.status, ApplicationStatus::Draft);
        assert!(new_app.cover_letter.is_none());
    }

    #[tokio::test]
    async fn test_cover_letter_generated_on_request() {
        let (storage, job_id, _) = seeded().await;
        let mut req = request(job_id);
        req.generate_cover_letter = true;
        let new_app = prepare_application(&storage, &chain(&[]), req).await.unwrap();
        let letter = new_app.cover_letter.unwrap();
        assert!(letter.contains("Rust Engineer position at Acme"));
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let (storage, _, _) = seeded().await;
        let err = prepare_application(&storage, &chain(&[]), request(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
