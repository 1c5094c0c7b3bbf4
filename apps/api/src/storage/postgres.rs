use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{application_not_found, job_not_found, resume_not_found, Inserted, Storage};
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
use crate::models::job::{Job, JobFilter, JobPatch, JobStatus, NewJob};
use crate::models::preferences::SearchPreferences;
use crate::models::resume::{NewResume, Resume, ResumePatch};
use crate::models::DashboardStats;

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: String,
    location: String,
    description: String,
    url: String,
    source: String,
    salary: Option<String>,
    job_type: Option<String>,
    posted_at: Option<String>,
    scraped_at: DateTime<Utc>,
    match_score: Option<i32>,
    status: String,
    notes: Option<String>,
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: row.id,
            title: row.title,
            company: row.company,
            location: row.location,
            description: row.description,
            url: row.url,
            source: row.source.parse().map_err(|e: String| AppError::Internal(anyhow!(e)))?,
            salary: row.salary,
            job_type: row.job_type,
            posted_at: row.posted_at,
            scraped_at: row.scraped_at,
            match_score: row.match_score.map(|s| s.clamp(0, 100) as u32),
            status: row.status.parse().map_err(|e: String| AppError::Internal(anyhow!(e)))?,
            notes: row.notes,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResumeRow {
    id: Uuid,
    name: String,
    content: String,
    skills: Vec<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for Resume {
    fn from(row: ResumeRow) -> Self {
        Resume {
            id: row.id,
            name: row.name,
            content: row.content,
            skills: row.skills,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    resume_id: Uuid,
    status: String,
    cover_letter: Option<String>,
    notes: Option<String>,
    applied_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = AppError;

    fn try_from(row: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Application {
            id: row.id,
            job_id: row.job_id,
            resume_id: row.resume_id,
            status: row.status.parse().map_err(|e: String| AppError::Internal(anyhow!(e)))?,
            cover_letter: row.cover_letter,
            notes: row.notes,
            applied_at: row.applied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed store. Schema lives in `migrations/0001_init.sql`.
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::try_from)
            .transpose()
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM jobs WHERE TRUE");
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(source) = filter.source {
            query.push(" AND source = ").push_bind(source.as_str());
        }
        if let Some(min) = filter.min_score {
            query.push(" AND match_score >= ").push_bind(i64::from(min));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"));
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR company ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY scraped_at DESC");

        query
            .build_query_as::<JobRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Job::try_from)
            .collect()
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        self.fetch_job(id).await
    }

    async fn get_job_by_url(&self, url: &str) -> Result<Option<Job>, AppError> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn create_job(&self, new_job: NewJob) -> Result<Inserted, AppError> {
        let job = new_job.into_job();
        let inserted = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs
                (id, title, company, location, description, url, source,
                 salary, job_type, posted_at, scraped_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (url) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.url)
        .bind(job.source.as_str())
        .bind(&job.salary)
        .bind(&job.job_type)
        .bind(&job.posted_at)
        .bind(job.scraped_at)
        .bind(job.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok(Inserted::Created(row.try_into()?)),
            None => {
                let existing = self.get_job_by_url(&job.url).await?.ok_or_else(|| {
                    AppError::Internal(anyhow!("Job with url {} vanished after conflict", job.url))
                })?;
                Ok(Inserted::Existing(existing))
            }
        }
    }

    async fn update_job(&self, id: Uuid, patch: JobPatch) -> Result<Job, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            UPDATE jobs SET
                status = COALESCE($2, status),
                match_score = COALESCE($3, match_score),
                notes = COALESCE($4, notes)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.match_score.map(|s| s.min(100) as i32))
        .bind(patch.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| job_not_found(id))?;
        row.try_into()
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(job_not_found(id));
        }
        Ok(())
    }

    async fn list_resumes(&self) -> Result<Vec<Resume>, AppError> {
        let rows = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Resume::from).collect())
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<Resume>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Resume::from))
    }

    async fn get_default_resume(&self) -> Result<Option<Resume>, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE is_default LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Resume::from))
    }

    async fn create_resume(&self, new_resume: NewResume) -> Result<Resume, AppError> {
        let mut resume = new_resume.into_resume();
        let mut tx = self.pool.begin().await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resumes")
            .fetch_one(&mut *tx)
            .await?;
        if count == 0 {
            resume.is_default = true;
        }
        if resume.is_default {
            sqlx::query("UPDATE resumes SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (id, name, content, skills, is_default, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(&resume.name)
        .bind(&resume.content)
        .bind(&resume.skills)
        .bind(resume.is_default)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_resume(&self, id: Uuid, patch: ResumePatch) -> Result<Resume, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut resume: Resume =
            sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| resume_not_found(id))?
                .into();
        patch.apply(&mut resume);

        if resume.is_default {
            sqlx::query("UPDATE resumes SET is_default = FALSE WHERE is_default AND id <> $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            UPDATE resumes
            SET name = $2, content = $3, skills = $4, is_default = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&resume.name)
        .bind(&resume.content)
        .bind(&resume.skills)
        .bind(resume.is_default)
        .bind(resume.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_resume(&self, id: Uuid) -> Result<(), AppError> {
        let (in_use,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM applications WHERE resume_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if in_use {
            return Err(AppError::Validation(format!(
                "Resume {id} is used by an application and cannot be deleted"
            )));
        }

        let result = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(resume_not_found(id));
        }
        Ok(())
    }

    async fn list_applications(&self, job_id: Option<Uuid>) -> Result<Vec<Application>, AppError> {
        sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE ($1::uuid IS NULL OR job_id = $1) ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Application::try_from)
        .collect()
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Application::try_from)
            .transpose()
    }

    async fn create_application(&self, new_app: NewApplication) -> Result<Application, AppError> {
        if self.fetch_job(new_app.job_id).await?.is_none() {
            return Err(AppError::Validation(format!("Job {} does not exist", new_app.job_id)));
        }
        if self.get_resume(new_app.resume_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "Resume {} does not exist",
                new_app.resume_id
            )));
        }

        let app = new_app.into_application();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications
                (id, job_id, resume_id, status, cover_letter, notes, applied_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(app.id)
        .bind(app.job_id)
        .bind(app.resume_id)
        .bind(app.status.as_str())
        .bind(&app.cover_letter)
        .bind(&app.notes)
        .bind(app.applied_at)
        .bind(app.created_at)
        .bind(app.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        if app.status == ApplicationStatus::Applied {
            mark_job_applied(&mut tx, app.job_id).await?;
        }
        tx.commit().await?;
        row.try_into()
    }

    async fn update_application(
        &self,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut app: Application = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| application_not_found(id))?
        .try_into()?;
        let previous = app.status;
        patch.apply(&mut app).map_err(AppError::Validation)?;

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET status = $2, cover_letter = $3, notes = $4, applied_at = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(app.status.as_str())
        .bind(&app.cover_letter)
        .bind(&app.notes)
        .bind(app.applied_at)
        .bind(app.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        if previous != ApplicationStatus::Applied && app.status == ApplicationStatus::Applied {
            mark_job_applied(&mut tx, app.job_id).await?;
        }
        tx.commit().await?;
        row.try_into()
    }

    async fn delete_application(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(application_not_found(id));
        }
        Ok(())
    }

    async fn get_search_preferences(&self) -> Result<SearchPreferences, AppError> {
        let row: Option<(sqlx::types::Json<SearchPreferences>,)> =
            sqlx::query_as("SELECT data FROM search_preferences WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(json,)| json.0).unwrap_or_default())
    }

    async fn put_search_preferences(
        &self,
        prefs: SearchPreferences,
    ) -> Result<SearchPreferences, AppError> {
        sqlx::query(
            r#"
            INSERT INTO search_preferences (id, data) VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(sqlx::types::Json(&prefs))
        .execute(&self.pool)
        .await?;
        Ok(prefs)
    }

    async fn stats(&self) -> Result<DashboardStats, AppError> {
        let (total_jobs, new_jobs, average_match_score): (i64, i64, Option<f64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = $1),
                   AVG(match_score)::float8
            FROM jobs
            "#,
        )
        .bind(JobStatus::New.as_str())
        .fetch_one(&self.pool)
        .await?;

        let by_status: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM applications GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let (resumes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resumes")
            .fetch_one(&self.pool)
            .await?;

        let applications_by_status: BTreeMap<String, usize> = by_status
            .into_iter()
            .map(|(status, count)| (status, count as usize))
            .collect();

        Ok(DashboardStats {
            total_jobs: total_jobs as usize,
            new_jobs: new_jobs as usize,
            total_applications: applications_by_status.values().sum(),
            applications_by_status,
            average_match_score,
            resumes: resumes as usize,
        })
    }
}

async fn mark_job_applied(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    job_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query("UPDATE jobs SET status = $1 WHERE id = $2")
        .bind(JobStatus::Applied.as_str())
        .bind(job_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
