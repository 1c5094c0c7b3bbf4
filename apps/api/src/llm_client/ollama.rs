use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{send_with_retry, LlmError, LlmProvider};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// How long a probe result is trusted before the server is asked again.
const PROBE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local Ollama server. Availability is probed via `GET /api/tags`.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    probe: Mutex<Option<(Instant, bool)>>,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build Ollama HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            probe: Mutex::new(None),
        })
    }

    fn cached_probe(&self) -> Option<bool> {
        let guard = self.probe.lock().ok()?;
        (*guard).and_then(|(at, up)| (at.elapsed() < PROBE_TTL).then_some(up))
    }

    fn remember_probe(&self, up: bool) {
        if let Ok(mut guard) = self.probe.lock() {
            *guard = Some((Instant::now(), up));
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        if let Some(up) = self.cached_probe() {
            return up;
        }

        let up = match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama probe failed");
                false
            }
        };

        self.remember_probe(up);
        up
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
        };
        let url = format!("{}/api/generate", self.base_url);

        let response = send_with_retry(self.name(), || self.client.post(&url).json(&body)).await;
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                // skip this provider until the probe expires
                self.remember_probe(false);
                return Err(e);
            }
        };

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}
