use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use nq_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::LlmConfig;

pub mod gemini;
pub mod groq;
pub mod ollama;

pub use gemini::GeminiModel;
pub use groq::GroqModel;
pub use ollama::OllamaModel;

/// Which backend a generation call should prefer. The declaration order is
/// the fallback order: hosted, high-quality backends first, the local
/// last-resort backend at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Gemini,
    Groq,
    Ollama,
}

impl Backend {
    pub const CHAIN: [Backend; 3] = [Backend::Gemini, Backend::Groq, Backend::Ollama];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Gemini => "gemini",
            Backend::Groq => "groq",
            Backend::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "groq" => Ok(Backend::Groq),
            "ollama" => Ok(Backend::Ollama),
            other => Err(Error::Configuration(format!("unknown backend: {other}"))),
        }
    }
}

#[async_trait]
pub trait LlmModel: Send + Sync {
    fn name(&self) -> &str;

    /// Generate up to `max_tokens` tokens of text for `prompt`.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Uniform generation contract over the backends, with an ordered fallback
/// chain. A backend that fails (missing credentials, HTTP error, timeout,
/// malformed response) is logged and skipped, never retried; only the last
/// backend's failure propagates. The chain position is call-scoped, so a
/// fallback taken in one call never leaks into a concurrent sibling.
pub struct LlmGateway {
    models: Vec<(Backend, Arc<dyn LlmModel>)>,
}

impl fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = self.models.iter().map(|(b, _)| b.as_str()).collect();
        f.debug_struct("LlmGateway").field("chain", &chain).finish()
    }
}

impl LlmGateway {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let models: Vec<(Backend, Arc<dyn LlmModel>)> = vec![
            (Backend::Gemini, Arc::new(GeminiModel::new(client.clone(), config))),
            (Backend::Groq, Arc::new(GroqModel::new(client.clone(), config))),
            (Backend::Ollama, Arc::new(OllamaModel::new(client, config))),
        ];
        Ok(Self { models })
    }

    /// Gateway over an explicit chain. Used by tests to inject stub models.
    pub fn with_models(models: Vec<(Backend, Arc<dyn LlmModel>)>) -> Self {
        Self { models }
    }

    pub async fn generate(&self, backend: Backend, prompt: &str, max_tokens: u32) -> Result<String> {
        let start = self
            .models
            .iter()
            .position(|(b, _)| *b == backend)
            .unwrap_or(0);
        let chain = &self.models[start..];

        let mut last_err = None;
        for (i, (b, model)) in chain.iter().enumerate() {
            match model.generate(prompt, max_tokens).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if i + 1 < chain.len() {
                        warn!(backend = %b, error = %e, "generation failed, falling back to next backend");
                    }
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Configuration("no backends configured".to_string())))
    }

    /// Summarize `text` in `language`, keeping proper nouns and technical
    /// terms in their original form. Same fallback semantics as `generate`.
    pub async fn summarize_in_language(
        &self,
        backend: Backend,
        text: &str,
        language: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Summarize the following text in {language}.\n\
             Keep proper nouns, product names and technical terms in their original form.\n\n\
             Text:\n{text}\n\nSummary:"
        );
        self.generate(backend, &prompt, 512).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Stub model: returns a fixed reply, or fails when `reply` is `None`.
    /// Records every prompt it was asked to generate for.
    pub struct StubModel {
        pub label: &'static str,
        pub reply: Option<String>,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl StubModel {
        pub fn ok(label: &'static str, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                label,
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(label: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                reply: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmModel for StubModel {
        fn name(&self) -> &str {
            self.label
        }

        async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(Error::Transport(format!("{} is down", self.label))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubModel;
    use super::*;

    #[test]
    fn backend_round_trips_through_strings() {
        for backend in Backend::CHAIN {
            assert_eq!(Backend::from_str(backend.as_str()).unwrap(), backend);
        }
        assert!(Backend::from_str("deepseek").is_err());
    }

    #[tokio::test]
    async fn falls_back_to_next_backend_on_failure() {
        let gemini = StubModel::failing("gemini");
        let groq = StubModel::ok("groq", "groq says hi");
        let ollama = StubModel::ok("ollama", "ollama says hi");
        let gateway = LlmGateway::with_models(vec![
            (Backend::Gemini, gemini.clone()),
            (Backend::Groq, groq.clone()),
            (Backend::Ollama, ollama.clone()),
        ]);

        let text = gateway.generate(Backend::Gemini, "hello", 64).await.unwrap();
        assert_eq!(text, "groq says hi");
        assert_eq!(gemini.call_count(), 1);
        assert_eq!(groq.call_count(), 1);
        assert_eq!(ollama.call_count(), 0);
    }

    #[tokio::test]
    async fn chain_starts_at_the_requested_backend() {
        let gemini = StubModel::ok("gemini", "gemini says hi");
        let groq = StubModel::ok("groq", "groq says hi");
        let ollama = StubModel::ok("ollama", "ollama says hi");
        let gateway = LlmGateway::with_models(vec![
            (Backend::Gemini, gemini.clone()),
            (Backend::Groq, groq.clone()),
            (Backend::Ollama, ollama.clone()),
        ]);

        let text = gateway.generate(Backend::Ollama, "hello", 64).await.unwrap();
        assert_eq!(text, "ollama says hi");
        assert_eq!(gemini.call_count(), 0);
        assert_eq!(groq.call_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_chain_propagates_the_last_error() {
        let groq = StubModel::failing("groq");
        let ollama = StubModel::failing("ollama");
        let gateway = LlmGateway::with_models(vec![
            (Backend::Groq, groq.clone()),
            (Backend::Ollama, ollama.clone()),
        ]);

        let err = gateway.generate(Backend::Groq, "hello", 64).await.unwrap_err();
        assert!(err.to_string().contains("ollama is down"));
        assert_eq!(groq.call_count(), 1);
        assert_eq!(ollama.call_count(), 1);
    }

    #[tokio::test]
    async fn summarize_in_language_carries_the_language_hint() {
        let groq = StubModel::ok("groq", "ملخص");
        let gateway = LlmGateway::with_models(vec![(Backend::Groq, groq.clone())]);

        let text = gateway
            .summarize_in_language(Backend::Groq, "OpenAI shipped a model", "Arabic")
            .await
            .unwrap();
        assert_eq!(text, "ملخص");
        let prompts = groq.prompts.lock().unwrap();
        assert!(prompts[0].contains("Arabic"));
        assert!(prompts[0].contains("OpenAI shipped a model"));
    }
}
