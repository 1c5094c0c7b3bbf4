use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{application_not_found, job_not_found, resume_not_found, Inserted, Storage};
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
use crate::models::job::{Job, JobFilter, JobPatch, JobStatus, NewJob};
use crate::models::preferences::SearchPreferences;
use crate::models::resume::{NewResume, Resume, ResumePatch};
use crate::models::DashboardStats;

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    resumes: HashMap<Uuid, Resume>,
    applications: HashMap<Uuid, Application>,
    preferences: SearchPreferences,
}

impl Inner {
    fn clear_default_except(&mut self, keep: Uuid) {
        for resume in self.resumes.values_mut() {
            if resume.id != keep {
                resume.is_default = false;
            }
        }
    }
}

/// In-process store. One lock guards all maps so cross-entity rules stay atomic.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<Inner>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, AppError> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn get_job_by_url(&self, url: &str) -> Result<Option<Job>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.values().find(|job| job.url == url).cloned())
    }

    async fn create_job(&self, new_job: NewJob) -> Result<Inserted, AppError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.jobs.values().find(|job| job.url == new_job.url) {
            return Ok(Inserted::Existing(existing.clone()));
        }
        let job = new_job.into_job();
        inner.jobs.insert(job.id, job.clone());
        Ok(Inserted::Created(job))
    }

    async fn update_job(&self, id: Uuid, patch: JobPatch) -> Result<Job, AppError> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or_else(|| job_not_found(id))?;
        if let Some(status) = patch.status {
            job.status = status;
        }
        if let Some(score) = patch.match_score {
            job.match_score = Some(score.min(100));
        }
        if let Some(notes) = patch.notes {
            job.notes = Some(notes);
        }
        Ok(job.clone())
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.jobs.remove(&id).ok_or_else(|| job_not_found(id))?;
        inner.applications.retain(|_, app| app.job_id != id);
        Ok(())
    }

    async fn list_resumes(&self) -> Result<Vec<Resume>, AppError> {
        let inner = self.inner.read().await;
        let mut resumes: Vec<Resume> = inner.resumes.values().cloned().collect();
        resumes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resumes)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        Ok(self.inner.read().await.resumes.get(&id).cloned())
    }

    async fn get_default_resume(&self) -> Result<Option<Resume>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.resumes.values().find(|r| r.is_default).cloned())
    }

    async fn create_resume(&self, new_resume: NewResume) -> Result<Resume, AppError> {
        let mut inner = self.inner.write().await;
        let mut resume = new_resume.into_resume();
        if inner.resumes.is_empty() {
            resume.is_default = true;
        }
        if resume.is_default {
            inner.clear_default_except(resume.id);
        }
        inner.resumes.insert(resume.id, resume.clone());
        Ok(resume)
    }

    async fn update_resume(&self, id: Uuid, patch: ResumePatch) -> Result<Resume, AppError> {
        let mut inner = self.inner.write().await;
        let resume = inner.resumes.get_mut(&id).ok_or_else(|| resume_not_found(id))?;
        patch.apply(resume);
        let updated = resume.clone();
        if updated.is_default {
            inner.clear_default_except(id);
        }
        Ok(updated)
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if !inner.resumes.contains_key(&id) {
            return Err(resume_not_found(id));
        }
        if inner.applications.values().any(|app| app.resume_id == id) {
            return Err(AppError::Validation(format!(
                "Resume {id} is used by an application and cannot be deleted"
            )));
        }
        inner.resumes.remove(&id);
        Ok(())
    }

    async fn list_applications(&self, job_id: Option<Uuid>) -> Result<Vec<Application>, AppError> {
        let inner = self.inner.read().await;
        let mut apps: Vec<Application> = inner
            .applications
            .values()
            .filter(|app| job_id.map_or(true, |id| app.job_id == id))
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        Ok(self.inner.read().await.applications.get(&id).cloned())
    }

    async fn create_application(&self, new_app: NewApplication) -> Result<Application, AppError> {
        let mut inner = self.inner.write().await;
        if !inner.jobs.contains_key(&new_app.job_id) {
            return Err(AppError::Validation(format!("Job {} does not exist", new_app.job_id)));
        }
        if !inner.resumes.contains_key(&new_app.resume_id) {
            return Err(AppError::Validation(format!(
                "Resume {} does not exist",
                new_app.resume_id
            )));
        }
        let app = new_app.into_application();
        if app.status == ApplicationStatus::Applied {
            if let Some(job) = inner.jobs.get_mut(&app.job_id) {
                job.status = JobStatus::Applied;
            }
        }
        inner.applications.insert(app.id, app.clone());
        Ok(app)
    }

    async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Application, AppError> {
        let mut inner = self.inner.write().await;
        let app = inner
            .applications
            .get_mut(&id)
            .ok_or_else(|| application_not_found(id))?;
        let previous = app.status;
        patch.apply(app).map_err(AppError::Validation)?;
        let updated = app.clone();
        if previous != ApplicationStatus::Applied && updated.status == ApplicationStatus::Applied {
            if let Some(job) = inner.jobs.get_mut(&updated.job_id) {
                job.status = JobStatus::Applied;
            }
        }
        Ok(updated)
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner
            .applications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| application_not_found(id))
    }

    async fn get_search_preferences(&self) -> Result<SearchPreferences, AppError> {
        Ok(self.inner.read().await.preferences.clone())
    }

    async fn put_search_preferences(
        &self,
        prefs: SearchPreferences,
    ) -> Result<SearchPreferences, AppError> {
        let mut inner = self.inner.write().await;
        inner.preferences = prefs.clone();
        Ok(prefs)
    }

    async fn stats(&self) -> Result<DashboardStats, AppError> {
        let inner = self.inner.read().await;

        let mut applications_by_status = BTreeMap::new();
        for app in inner.applications.values() {
            *applications_by_status
                .entry(app.status.as_str().to_string())
                .or_insert(0) += 1;
        }

        let scores: Vec<u32> = inner.jobs.values().filter_map(|j| j.match_score).collect();
        let average_match_score = (!scores.is_empty())
            .then(|| scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64);

        Ok(DashboardStats {
            total_jobs: inner.jobs.len(),
            new_jobs: inner
                .jobs
                .values()
                .filter(|j| j.status == JobStatus::New)
                .count(),
            total_applications: inner.applications.len(),
            applications_by_status,
            average_match_score,
            resumes: inner.resumes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobSource;

    fn new_job(url: &str) -> NewJob {
        NewJob {
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            description: "Rust, Tokio, PostgreSQL".to_string(),
            url: url.to_string(),
            source: JobSource::Indeed,
            salary: None,
            job_type: None,
            posted_at: None,
        }
    }

    fn new_resume(name: &str, is_default: bool) -> NewResume {
        NewResume {
            name: name.to_string(),
            content: "Rust developer".to_string(),
            skills: vec!["Rust".to_string()],
            is_default,
        }
    }

    #[tokio::test]
    async fn test_duplicate_url_returns_existing_job() {
        let store = MemStorage::new();
        let first = store.create_job(new_job("https://a.dev/1")).await.unwrap();
        assert!(first.is_new());

        let second = store.create_job(new_job("https://a.dev/1")).await.unwrap();
        assert!(!second.is_new());
        assert_eq!(first.into_job().id, second.into_job().id);
        assert_eq!(store.list_jobs(&JobFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_first_resume_becomes_default() {
        let store = MemStorage::new();
        let resume = store.create_resume(new_resume("main", false)).await.unwrap();
        assert!(resume.is_default);
    }

    #[tokio::test]
    async fn test_single_default_resume() {
        let store = MemStorage::new();
        let first = store.create_resume(new_resume("first", true)).await.unwrap();
        let second = store.create_resume(new_resume("second", true)).await.unwrap();

        let default = store.get_default_resume().await.unwrap().unwrap();
        assert_eq!(default.id, second.id);
        assert!(!store.get_resume(first.id).await.unwrap().unwrap().is_default);

        store
            .update_resume(
                first.id,
                ResumePatch {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let defaults = store
            .list_resumes()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.is_default)
            .count();
        assert_eq!(defaults, 1);
    }

    #[tokio::test]
    async fn test_deleting_job_cascades_to_applications() {
        let store = MemStorage::new();
        let job = store.create_job(new_job("https://a.dev/2")).await.unwrap().into_job();
        let resume = store.create_resume(new_resume("r", true)).await.unwrap();
        store
            .create_application(NewApplication {
                job_id: job.id,
                resume_id: resume.id,
                status: ApplicationStatus::Draft,
                cover_letter: None,
                notes: None,
            })
            .await
            .unwrap();

        store.delete_job(job.id).await.unwrap();
        assert!(store.list_applications(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_in_use_cannot_be_deleted() {
        let store = MemStorage::new();
        let job = store.create_job(new_job("https://a.dev/3")).await.unwrap().into_job();
        let resume = store.create_resume(new_resume("r", true)).await.unwrap();
        store
            .create_application(NewApplication {
                job_id: job.id,
                resume_id: resume.id,
                status: ApplicationStatus::Draft,
                cover_letter: None,
                notes: None,
            })
            .await
            .unwrap();

        let err = store.delete_resume(resume.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_application_requires_existing_job() {
        let store = MemStorage::new();
        let resume = store.create_resume(new_resume("r", true)).await.unwrap();
        let err = store
            .create_application(NewApplication {
                job_id: Uuid::new_v4(),
                resume_id: resume.id,
                status: ApplicationStatus::Draft,
                cover_letter: None,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_applying_marks_job_applied() {
        let store = MemStorage::new();
        let job = store.create_job(new_job("https://a.dev/4")).await.unwrap().into_job();
        let resume = store.create_resume(new_resume("r", true)).await.unwrap();
        let app = store
            .create_application(NewApplication {
                job_id: job.id,
                resume_id: resume.id,
                status: ApplicationStatus::Draft,
                cover_letter: None,
                notes: None,
            })
            .await
            .unwrap();

        let updated = store
            .update_application(
                app.id,
                ApplicationPatch {
                    status: Some(ApplicationStatus::Applied),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.applied_at.is_some());
        let job = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Applied);
    }

    #[tokio::test]
    async fn test_editing_applied_application_keeps_job_status() {
        let store = MemStorage::new();
        let job = store.create_job(new_job("https://a.dev/5")).await.unwrap().into_job();
        let resume = store.create_resume(new_resume("r", true)).await.unwrap();
        let app = store
            .create_application(NewApplication {
                job_id: job.id,
                resume_id: resume.id,
                status: ApplicationStatus::Applied,
                cover_letter: None,
                notes: None,
            })
            .await
            .unwrap();

        store
            .update_job(
                job.id,
                JobPatch {
                    status: Some(JobStatus::Ignored),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update_application(
                app.id,
                ApplicationPatch {
                    notes: Some("followed up by email".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let job = store.get_job(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Ignored);
    }

    #[tokio::test]
    async fn test_stats_counts_and_average() {
        let store = MemStorage::new();
        let a = store.create_job(new_job("https://a.dev/5")).await.unwrap().into_job();
        let b = store.create_job(new_job("https://a.dev/6")).await.unwrap().into_job();
        store
            .update_job(
                a.id,
                JobPatch {
                    match_score: Some(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .update_job(
                b.id,
                JobPatch {
                    match_score: Some(40),
                    status: Some(JobStatus::Saved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.new_jobs, 1);
        assert_eq!(stats.average_match_score, Some(60.0));
        assert_eq!(stats.total_applications, 0);
    }
}
