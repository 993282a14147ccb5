use std::fmt;

use async_trait::async_trait;
use nq_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LlmModel;
use crate::config::LlmConfig;

const CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are a helpful AI news assistant.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

pub struct GroqModel {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl fmt::Debug for GroqModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqModel")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

impl GroqModel {
    pub fn new(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        }
    }
}

#[async_trait]
impl LlmModel for GroqModel {
    fn name(&self) -> &str {
        "groq"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Configuration("GROQ_API_KEY not set".to_string()))?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens,
        };

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Transport("Groq returned no choices".to_string()))?;

        Ok(choice.message.content.trim().to_string())
    }
}
