use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a job posting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    Indeed,
    Linkedin,
    Remoteok,
    Manual,
}

impl JobSource {
    /// Sources the scraper knows how to search, in the order they are visited.
    pub const SCRAPABLE: [JobSource; 3] = [JobSource::Indeed, JobSource::Linkedin, JobSource::Remoteok];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Indeed => "indeed",
            JobSource::Linkedin => "linkedin",
            JobSource::Remoteok => "remoteok",
            JobSource::Manual => "manual",
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "indeed" => Ok(JobSource::Indeed),
            "linkedin" => Ok(JobSource::Linkedin),
            "remoteok" => Ok(JobSource::Remoteok),
            "manual" => Ok(JobSource::Manual),
            other => Err(format!("unknown job source '{other}'")),
        }
    }
}

/// Triage state of a job in the user's pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    New,
    Saved,
    Applied,
    Ignored,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Saved => "saved",
            JobStatus::Applied => "applied",
            JobStatus::Ignored => "ignored",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "saved" => Ok(JobStatus::Saved),
            "applied" => Ok(JobStatus::Applied),
            "ignored" => Ok(JobStatus::Ignored),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    /// Unique across all jobs; scrape dedup keys on it.
    pub url: String,
    pub source: JobSource,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub posted_at: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub match_score: Option<u32>,
    pub status: JobStatus,
    pub notes: Option<String>,
}

/// Input for inserting a job, either scraped or entered by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default = "manual_source")]
    pub source: JobSource,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
}

fn manual_source() -> JobSource {
    JobSource::Manual
}

impl NewJob {
    pub fn into_job(self) -> Job {
        Job {
            id: Uuid::new_v4(),
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            url: self.url,
            source: self.source,
            salary: self.salary,
            job_type: self.job_type,
            posted_at: self.posted_at,
            scraped_at: Utc::now(),
            match_score: None,
            status: JobStatus::New,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub match_score: Option<u32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub source: Option<JobSource>,
    pub search: Option<String>,
    pub min_score: Option<u32>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if self.status.is_some_and(|s| s != job.status) {
            return false;
        }
        if self.source.is_some_and(|s| s != job.source) {
            return false;
        }
        if let Some(min) = self.min_score {
            if job.match_score.map_or(true, |score| score < min) {
                return false;
            }
        }
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let haystacks = [&job.title, &job.company, &job.description];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        true
    }
}
