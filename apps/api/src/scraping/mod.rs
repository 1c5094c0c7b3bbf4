//! Job board scraping.
//!
//! Boards are visited one after another with a fixed pause in between. A board
//! that fails is logged and recorded in the report; it never aborts the run and
//! is not retried.

pub mod html;
pub mod indeed;
pub mod linkedin;
pub mod remoteok;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::job::{Job, JobSource, NewJob};
use crate::models::preferences::SearchPreferences;
use crate::storage::Storage;

pub use indeed::Indeed;
pub use linkedin::LinkedIn;
pub use remoteok::RemoteOk;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_LIMIT: usize = 25;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{board} returned status {status}")]
    Status { board: JobSource, status: u16 },

    #[error("Could not parse {board} response: {message}")]
    Parse { board: JobSource, message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl From<&SearchPreferences> for SearchQuery {
    fn from(prefs: &SearchPreferences) -> Self {
        Self {
            keywords: prefs.keywords.clone(),
            location: prefs.location.clone(),
            remote_only: prefs.remote_only,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// One posting as read off a board, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub source: JobSource,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub posted_at: Option<String>,
}

impl From<ScrapedJob> for NewJob {
    fn from(job: ScrapedJob) -> Self {
        NewJob {
            title: job.title,
            company: job.company,
            location: job.location,
            description: job.description,
            url: job.url,
            source: job.source,
            salary: job.salary,
            job_type: job.job_type,
            posted_at: job.posted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: JobSource,
    pub found: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub found: usize,
    pub per_source: Vec<SourceReport>,
    #[serde(skip)]
    pub jobs: Vec<ScrapedJob>,
}

/// A job board the scraper can search.
#[async_trait]
pub trait JobBoard: Send + Sync {
    fn source(&self) -> JobSource;

    fn request(&self, client: &Client, query: &SearchQuery) -> RequestBuilder;

    /// Parses a response body. Postings without a title or url are skipped.
    fn parse(&self, body: &str, query: &SearchQuery) -> Result<Vec<ScrapedJob>, ScrapeError>;

    async fn fetch(&self, client: &Client, query: &SearchQuery) -> Result<String, ScrapeError> {
        let response = self.request(client, query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                board: self.source(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[derive(Clone)]
pub struct JobScraper {
    client: Client,
    boards: Vec<Arc<dyn JobBoard>>,
    delay: Duration,
}

impl JobScraper {
    pub fn new(delay: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build scraper HTTP client")?;
        Ok(Self::with_boards(
            client,
            vec![Arc::new(Indeed), Arc::new(LinkedIn), Arc::new(RemoteOk)],
            delay,
        ))
    }

    pub fn with_boards(client: Client, boards: Vec<Arc<dyn JobBoard>>, delay: Duration) -> Self {
        Self {
            client,
            boards,
            delay,
        }
    }

    /// Searches each requested board in turn. Boards not in `sources` are skipped.
    pub async fn search(&self, query: &SearchQuery, sources: &[JobSource]) -> ScrapeReport {
        let mut report = ScrapeReport::default();
        let boards: Vec<&Arc<dyn JobBoard>> = self
            .boards
            .iter()
            .filter(|b| sources.contains(&b.source()))
            .collect();

        for (i, board) in boards.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let source = board.source();
            let result = match board.fetch(&self.client, query).await {
                Ok(body) => board.parse(&body, query),
                Err(e) => Err(e),
            };

            match result {
                Ok(mut jobs) => {
                    jobs.truncate(query.limit);
                    info!(source = %source, found = jobs.len(), "Scraped job board");
                    report.per_source.push(SourceReport {
                        source,
                        found: jobs.len(),
                        error: None,
                    });
                    report.found += jobs.len();
                    report.jobs.extend(jobs);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Job board scrape failed");
                    report.per_source.push(SourceReport {
                        source,
                        found: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        report
    }
}

/// Stores scraped jobs, returning only those whose url was not already known.
pub async fn ingest(storage: &dyn Storage, scraped: Vec<ScrapedJob>) -> Result<Vec<Job>, AppError> {
    let mut created = Vec::new();
    for job in scraped {
        let inserted = storage.create_job(job.into()).await?;
        if inserted.is_new() {
            created.push(inserted.into_job());
        }
    }
    info!(new_jobs = created.len(), "Ingested scraped jobs");
    Ok(created)
}
