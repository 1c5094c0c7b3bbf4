//! Storage: the persistence seam for jobs, resumes, applications and search preferences.
//!
//! `AppState` holds an `Arc<dyn Storage>`. `MemStorage` is used when no
//! `DATABASE_URL` is configured; `PgStorage` otherwise. Both enforce the same rules:
//! - job urls are unique; inserting a known url returns the stored job unchanged
//! - at most one resume is default, and the first resume created becomes default
//! - deleting a job cascades to its applications
//! - a resume referenced by an application cannot be deleted
//! - an application moving to `applied` marks its job `applied`

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch, NewApplication};
use crate::models::job::{Job, JobFilter, JobPatch, NewJob};
use crate::models::preferences::SearchPreferences;
use crate::models::resume::{NewResume, Resume, ResumePatch};
use crate::models::DashboardStats;

pub use memory::MemStorage;
pub use postgres::PgStorage;

/// Outcome of inserting a job: whether the url was new.
#[derive(Debug, Clone)]
pub enum Inserted {
    Created(Job),
    Existing(Job),
}

impl Inserted {
    pub fn into_job(self) -> Job {
        match self {
            Inserted::Created(job) | Inserted::Existing(job) => job,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Inserted::Created(_))
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, AppError>;
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError>;
    async fn get_job_by_url(&self, url: &str) -> Result<Option<Job>, AppError>;
    async fn create_job(&self, new_job: NewJob) -> Result<Inserted, AppError>;
    async fn update_job(&self, id: Uuid, patch: JobPatch) -> Result<Job, AppError>;
    async fn delete_job(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_resumes(&self) -> Result<Vec<Resume>, AppError>;
    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError>;
    async fn get_default_resume(&self) -> Result<Option<Resume>, AppError>;
    async fn create_resume(&self, new_resume: NewResume) -> Result<Resume, AppError>;
    async fn update_resume(&self, id: Uuid, patch: ResumePatch) -> Result<Resume, AppError>;
    async fn delete_resume(&self, id: Uuid) -> Result<(), AppError>;

    async fn list_applications(&self, job_id: Option<Uuid>) -> Result<Vec<Application>, AppError>;
    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError>;
    async fn create_application(&self, new_app: NewApplication) -> Result<Application, AppError>;
    async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Application, AppError>;
    async fn delete_application(&self, id: Uuid) -> Result<(), AppError>;

    async fn get_search_preferences(&self) -> Result<SearchPreferences, AppError>;
    async fn put_search_preferences(
        &self,
        prefs: SearchPreferences,
    ) -> Result<SearchPreferences, AppError>;

    async fn stats(&self) -> Result<DashboardStats, AppError>;
}

pub(crate) fn job_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

pub(crate) fn resume_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}

pub(crate) fn application_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}
