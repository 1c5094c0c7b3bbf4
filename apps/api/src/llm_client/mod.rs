/// LLM Client: the single point of entry for all model calls in Hirebot.
///
/// No other module may talk to a model provider directly. Providers are tried in a
/// fixed priority order (OpenAI, Ollama, HuggingFace); the first one that is
/// available and answers wins. When every provider fails, callers get
/// `LlmError::AllProvidersFailed` and switch to their own static fallback.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;

pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No LLM provider produced a usable answer")]
    AllProvidersFailed,
}

/// Text produced by a provider, tagged with the provider's name.
#[derive(Debug, Clone)]
pub struct LlmOutput<T = String> {
    pub value: T,
    pub provider: &'static str,
}

/// One model backend in the fallback chain.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Cheap readiness check. Unavailable providers are skipped without a call.
    async fn is_available(&self) -> bool;

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub name: &'static str,
    pub model: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainStatus {
    pub providers: Vec<ProviderStatus>,
    /// First available provider, i.e. the one the next call would try first.
    pub active: Option<&'static str>,
}

/// The single LLM client used by all services in Hirebot.
#[derive(Clone)]
pub struct LlmClient {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl LlmClient {
    /// Builds the chain from `providers`, preserving order as priority.
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    /// OpenAI → Ollama → HuggingFace. Keyless providers are left out entirely.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();
        if let Some(key) = &config.openai_api_key {
            providers.push(Arc::new(OpenAiProvider::new(key.clone(), config.openai_model.clone())?));
        }
        providers.push(Arc::new(OllamaProvider::new(
            config.ollama_url.clone(),
            config.ollama_model.clone(),
        )?));
        if let Some(key) = &config.huggingface_api_key {
            providers.push(Arc::new(HuggingFaceProvider::new(
                key.clone(),
                config.huggingface_model.clone(),
            )?));
        }
        Ok(Self::new(providers))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Calls each available provider in order until one returns non-empty text.
    pub async fn complete(&self, prompt: &str, system: &str) -> Result<LlmOutput, LlmError> {
        self.first_success(prompt, system, |text| Ok(text.trim().to_string()))
            .await
    }

    /// Like `complete`, but the answer must deserialize as `T`.
    /// A provider that answers with unparseable JSON counts as a failure and the chain moves on.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<LlmOutput<T>, LlmError> {
        self.first_success(prompt, system, |text| {
            serde_json::from_str::<T>(strip_json_fences(text)).map_err(LlmError::Parse)
        })
        .await
    }

    async fn first_success<T, F>(
        &self,
        prompt: &str,
        system: &str,
        parse: F,
    ) -> Result<LlmOutput<T>, LlmError>
    where
        F: Fn(&str) -> Result<T, LlmError>,
    {
        for provider in &self.providers {
            let name = provider.name();
            if !provider.is_available().await {
                debug!(provider = name, "LLM provider unavailable, skipping");
                continue;
            }

            let text = match provider.complete(prompt, system).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(provider = name, "LLM provider returned empty content");
                    continue;
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "LLM provider failed, trying next");
                    continue;
                }
            };

            match parse(&text) {
                Ok(value) => {
                    info!(provider = name, "LLM call succeeded");
                    return Ok(LlmOutput {
                        value,
                        provider: name,
                    });
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "LLM output unusable, trying next");
                }
            }
        }

        Err(LlmError::AllProvidersFailed)
    }

    pub async fn status(&self) -> ChainStatus {
        let mut providers = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            providers.push(ProviderStatus {
                name: provider.name(),
                model: provider.model().to_string(),
                available: provider.is_available().await,
            });
        }
        let active = providers.iter().find(|p| p.available).map(|p| p.name);
        ChainStatus { providers, active }
    }
}

/// Sends the request built by `build`, retrying 429 and 5xx with exponential backoff (1s, 2s).
/// Transport errors (refused connections, timeouts) fail at once so the chain can move on.
pub(crate) async fn send_with_retry<F>(provider: &str, build: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                "{provider} call attempt {} failed, retrying after {}ms...",
                attempt,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }

        let response = build().send().await?;

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!("{provider} API returned {}: {}", status, body);
            last_error = Some(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(LlmError::RateLimited {
        retries: MAX_RETRIES,
    }))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
