use anyhow::{bail, Context, Result};

use crate::scheduler::MAX_INTERVAL_HOURS;

/// Application configuration loaded from environment variables.
/// Every LLM provider is optional; a provider with no key is skipped by the fallback chain.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// When unset, the in-memory store is used and nothing survives a restart.
    pub database_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub huggingface_api_key: Option<String>,
    pub huggingface_model: String,
    pub scheduler_enabled: bool,
    pub search_interval_hours: u64,
    pub scrape_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 5000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            database_url: optional_env("DATABASE_URL"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: env_or("OLLAMA_MODEL", "llama3.2"),
            huggingface_api_key: optional_env("HUGGINGFACE_API_KEY"),
            huggingface_model: env_or("HUGGINGFACE_MODEL", "mistralai/Mistral-7B-Instruct-v0.2"),
            scheduler_enabled: optional_env("SCHEDULER_ENABLED")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            search_interval_hours: in_range(
                "SEARCH_INTERVAL_HOURS",
                parse_env("SEARCH_INTERVAL_HOURS", 6)?,
                1,
                MAX_INTERVAL_HOURS,
            )?,
            scrape_delay_ms: parse_env("SCRAPE_DELAY_MS", 2000)?,
        })
    }
}

/// Returns the variable's value, treating an empty string as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn in_range(key: &str, value: u64, min: u64, max: u64) -> Result<u64> {
    if !(min..=max).contains(&value) {
        bail!("Environment variable '{key}' must be between {min} and {max}, got {value}");
    }
    Ok(value)
}

#[cfg(test)]
impl Config {
    /// Configuration with no providers and no database, used by handler tests.
    pub fn for_tests() -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            database_url: None,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            ollama_url: "http://127.0.0.1:9".to_string(),
            ollama_model: "llama3.2".to_string(),
            huggingface_api_key: None,
            huggingface_model: "test/model".to_string(),
            scheduler_enabled: false,
            search_interval_hours: 6,
            scrape_delay_ms: 0,
        }
    }
}
