mod applications;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod resumes;
mod routes;
mod scheduler;
mod scraping;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{apply_schema, create_pool};
use crate::llm_client::LlmClient;
use crate::matching::fit_scoring::LlmMatchScorer;
use crate::routes::build_router;
use crate::scraping::JobScraper;
use crate::state::AppState;
use crate::storage::{MemStorage, PgStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; invalid numeric values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hirebot API v{}", env!("CARGO_PKG_VERSION"));

    // Storage: PostgreSQL when configured, in-memory otherwise
    let storage: Arc<dyn Storage> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            apply_schema(&pool).await?;
            Arc::new(PgStorage::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            Arc::new(MemStorage::new())
        }
    };

    // Initialize LLM fallback chain
    let llm = LlmClient::from_config(&config)?;
    info!("LLM provider chain: {}", llm.provider_names().join(" -> "));

    // LlmMatchScorer drops to keyword scoring whenever the chain is exhausted
    let matcher = Arc::new(LlmMatchScorer::new(llm.clone()));

    let scraper = Arc::new(JobScraper::new(Duration::from_millis(config.scrape_delay_ms))?);

    let state = AppState::new(storage, llm, matcher, scraper, &config);

    if config.scheduler_enabled {
        state.scheduler.start();
    } else {
        info!("Scheduled job search disabled; start it via POST /api/scheduler/start");
    }

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
