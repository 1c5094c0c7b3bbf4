//! Periodic job search using the saved search preferences.
//!
//! A run loads preferences, scrapes the configured boards, stores unseen jobs
//! and scores the new ones against the default resume. Runs never overlap: a
//! manual run requested while a periodic one is in flight waits for it.
//! Run history lives in memory only.

pub mod handlers;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::errors::AppError;
use crate::matching::fit_scoring::MatchScorer;
use crate::matching::score_jobs;
use crate::scraping::{ingest, JobScraper, SearchQuery, SourceReport};
use crate::storage::Storage;

/// Longest accepted period between runs (30 days).
pub const MAX_INTERVAL_HOURS: u64 = 720;

#[derive(Debug, Clone, Default)]
struct RunHistory {
    last_run_at: Option<DateTime<Utc>>,
    last_new_jobs: Option<usize>,
    last_error: Option<String>,
    runs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_hours: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_new_jobs: Option<usize>,
    pub last_error: Option<String>,
    pub runs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub found: usize,
    pub new_jobs: usize,
    pub scored: usize,
    /// New jobs scoring at or above the saved `min_match_score`.
    pub good_matches: usize,
    pub per_source: Vec<SourceReport>,
}

pub struct ScheduledSearch {
    storage: Arc<dyn Storage>,
    scraper: Arc<JobScraper>,
    scorer: Arc<dyn MatchScorer>,
    interval_hours: u64,
    task: Mutex<Option<JoinHandle<()>>>,
    run_lock: tokio::sync::Mutex<()>,
    history: Mutex<RunHistory>,
}

impl ScheduledSearch {
    pub fn new(
        storage: Arc<dyn Storage>,
        scraper: Arc<JobScraper>,
        scorer: Arc<dyn MatchScorer>,
        interval_hours: u64,
    ) -> Self {
        Self {
            storage,
            scraper,
            scorer,
            interval_hours: interval_hours.clamp(1, MAX_INTERVAL_HOURS),
            task: Mutex::new(None),
            run_lock: tokio::sync::Mutex::new(()),
            history: Mutex::new(RunHistory::default()),
        }
    }

    fn period(&self) -> Duration {
        Duration::from_secs(self.interval_hours * 3600)
    }

    /// Starts the periodic task. Returns false if it was already running.
    /// The first run happens one interval after start.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut task = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let this = Arc::clone(self);
        let period = self.period();
        *task = Some(tokio::spawn(async move {
            tracing::info!(interval_hours = this.interval_hours, "Scheduled job search started");
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match this.run_once().await {
                    Ok(summary) => tracing::info!(
                        found = summary.found,
                        new_jobs = summary.new_jobs,
                        good_matches = summary.good_matches,
                        "Scheduled job search finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled job search failed"),
                }
            }
        }));
        true
    }

    /// Stops the periodic task. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let mut task = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match task.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                tracing::info!("Scheduled job search stopped");
                was_running
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    pub async fn run_once(&self) -> Result<RunSummary, AppError> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();

        let result = self.search_and_score(started_at).await;

        let mut history = match self.history.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.runs += 1;
        history.last_run_at = Some(started_at);
        match &result {
            Ok(summary) => {
                history.last_new_jobs = Some(summary.new_jobs);
                history.last_error = None;
            }
            Err(e) => history.last_error = Some(e.to_string()),
        }
        result
    }

    async fn search_and_score(&self, started_at: DateTime<Utc>) -> Result<RunSummary, AppError> {
        let prefs = self.storage.get_search_preferences().await?;
        let query = SearchQuery::from(&prefs);

        let report = self.scraper.search(&query, &prefs.sources).await;
        let new_jobs = ingest(self.storage.as_ref(), report.jobs).await?;

        let matches = match self.storage.get_default_resume().await? {
            Some(resume) => {
                score_jobs(self.storage.as_ref(), self.scorer.as_ref(), &resume, &new_jobs).await
            }
            None => {
                tracing::info!("No default resume; new jobs left unscored");
                Vec::new()
            }
        };
        let good_matches = matches
            .iter()
            .filter(|m| m.report.score >= prefs.min_match_score)
            .count();

        Ok(RunSummary {
            started_at,
            found: report.found,
            new_jobs: new_jobs.len(),
            scored: matches.len(),
            good_matches,
            per_source: report.per_source,
        })
    }

    pub fn status(&self) -> SchedulerStatus {
        let history = self
            .history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default();
        SchedulerStatus {
            running: self.is_running(),
            interval_hours: self.interval_hours,
            last_run_at: history.last_run_at,
            last_new_jobs: history.last_new_jobs,
            last_error: history.last_error,
            runs: history.runs,
        }
    }
}
