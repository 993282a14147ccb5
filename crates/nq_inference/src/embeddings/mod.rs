use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use nq_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::{EmbeddingConfig, TOOL_TIMEOUT};

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn name(&self) -> &str;

    /// Embed a piece of text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

type ModelFactory = Box<dyn Fn() -> Arc<dyn EmbeddingModel> + Send + Sync>;

/// Owns the embedding model as a lazily-initialized shared resource. The
/// model is built once on first use, even under concurrent first callers,
/// and every output is checked against the configured dimension.
pub struct EmbeddingGateway {
    model: OnceCell<Arc<dyn EmbeddingModel>>,
    factory: ModelFactory,
    dim: usize,
}

impl fmt::Debug for EmbeddingGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingGateway")
            .field("model", &self.model.get().map(|m| m.name().to_string()))
            .field("dim", &self.dim)
            .finish()
    }
}

fn build_model(config: &EmbeddingConfig) -> Arc<dyn EmbeddingModel> {
    match &config.url {
        Some(url) => Arc::new(OllamaEmbedder::new(url.clone(), config.model.clone())),
        None => Arc::new(HashEmbedder::new(config.dim)),
    }
}

impl EmbeddingGateway {
    pub fn new(config: EmbeddingConfig) -> Self {
        let dim = config.dim;
        let factory: ModelFactory = Box::new(move || build_model(&config));
        Self {
            model: OnceCell::new(),
            factory,
            dim,
        }
    }

    /// Gateway with a preset model, bypassing lazy construction.
    pub fn with_model(model: Arc<dyn EmbeddingModel>, dim: usize) -> Self {
        let fallback = EmbeddingConfig { dim, url: None, model: String::new() };
        Self {
            model: OnceCell::new_with(Some(model)),
            factory: Box::new(move || build_model(&fallback)),
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.model.get_or_init(|| async { (self.factory)() }).await;
        let vec = model.embed(text).await?;
        if vec.len() != self.dim {
            return Err(Error::Configuration(format!(
                "embedding model '{}' returned {} dimensions, expected {}",
                model.name(),
                vec.len(),
                self.dim
            )));
        }
        Ok(vec)
    }
}

/// Deterministic offline embedder: feature-hashed bag of words, L2
/// normalized. Stands in for the model server in tests and air-gapped runs.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vec = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vec[(hasher.finish() % self.dim as u64) as usize] += 1.0;
        }
        let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        Ok(vec)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeddings served by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(TOOL_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, url, model }
    }
}

#[async_trait]
impl EmbeddingModel for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;
        Ok(response.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic_and_normalized() {
        let model = HashEmbedder::new(64);
        let a = model.embed("open source models are catching up").await.unwrap();
        let b = model.embed("open source models are catching up").await.unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zero_vector() {
        let model = HashEmbedder::new(16);
        let vec = model.embed("").await.unwrap();
        assert!(vec.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn gateway_rejects_dimension_mismatch() {
        let gateway = EmbeddingGateway::with_model(Arc::new(HashEmbedder::new(16)), 384);
        let err = gateway.embed("anything").await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn gateway_initializes_the_model_once() {
        let gateway = Arc::new(EmbeddingGateway::new(EmbeddingConfig {
            dim: 32,
            url: None,
            model: "all-minilm".to_string(),
        }));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gateway = gateway.clone();
            handles.push(tokio::spawn(async move { gateway.embed("race to init").await }));
        }
        let mut first: Option<Vec<f32>> = None;
        for handle in handles {
            let vec = handle.await.unwrap().unwrap();
            match &first {
                Some(expected) => assert_eq!(&vec, expected),
                None => first = Some(vec),
            }
        }
    }
}
