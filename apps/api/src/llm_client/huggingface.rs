use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{send_with_retry, LlmError, LlmProvider};

const HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
const MAX_NEW_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

/// HuggingFace hosted inference. Text-generation models take one prompt string,
/// so the system prompt is prepended.
pub struct HuggingFaceProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl HuggingFaceProvider {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HuggingFace HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }
}

fn build_inputs(prompt: &str, system: &str) -> String {
    format!("{system}\n\n{prompt}\n")
}

#[async_trait]
impl LlmProvider for HuggingFaceProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = InferenceRequest {
            inputs: build_inputs(prompt, system),
            parameters: InferenceParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                return_full_text: false,
            },
        };
        let url = format!("{HF_INFERENCE_URL}/{}", self.model);

        let response = send_with_retry(self.name(), || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        let generated: Vec<Generated> = response.json().await?;
        generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or(LlmError::EmptyContent)
    }
}
