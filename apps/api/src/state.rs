use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::fit_scoring::MatchScorer;
use crate::scheduler::ScheduledSearch;
use crate::scraping::JobScraper;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// In-memory or Postgres, chosen at startup from `DATABASE_URL`.
    pub storage: Arc<dyn Storage>,
    pub llm: LlmClient,
    /// Pluggable match scorer. Default: LlmMatchScorer, which falls back to keywords.
    pub matcher: Arc<dyn MatchScorer>,
    pub scraper: Arc<JobScraper>,
    pub scheduler: Arc<ScheduledSearch>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        llm: LlmClient,
        matcher: Arc<dyn MatchScorer>,
        scraper: Arc<JobScraper>,
        config: &Config,
    ) -> Self {
        let scheduler = Arc::new(ScheduledSearch::new(
            Arc::clone(&storage),
            Arc::clone(&scraper),
            Arc::clone(&matcher),
            config.search_interval_hours,
        ));
        Self {
            storage,
            llm,
            matcher,
            scraper,
            scheduler,
        }
    }
}
