use async_trait::async_trait;
use nq_core::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LlmModel;
use crate::config::LlmConfig;

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Local Ollama backend. Last resort in the fallback chain: always reachable
/// when the host is up, no credentials.
#[derive(Debug)]
pub struct OllamaModel {
    client: Client,
    url: String,
    model: String,
}

impl OllamaModel {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            url: config.ollama_url.clone(),
            model: config.ollama_model.clone(),
        }
    }
}

#[async_trait]
impl LlmModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions { num_predict: max_tokens },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response.response.unwrap_or_default().trim().to_string())
    }
}
