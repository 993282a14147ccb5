use std::env;
use std::time::Duration;

/// Embedding dimension. Decided at deployment time and must match every
/// stored blob exactly; a mismatch is a configuration error, not a runtime
/// condition.
pub const EMBED_DIM: usize = 384;

/// Candidates scoring below this cosine similarity are dropped.
pub const SIM_THRESHOLD: f32 = 0.15;

/// Default `k` for interactive retrieval.
pub const MAX_CONTEXT_ARTICLES: usize = 5;

/// Articles per map-phase chunk. Small on purpose, to keep each generation
/// call inside the context window of the weakest backend.
pub const CHUNK_SIZE: usize = 2;

/// Per-source cap applied on the digest path.
pub const MAX_PER_SOURCE: usize = 10;

/// Timeout for generation calls.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for short tool-style calls such as embedding requests.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(60);

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
            groq_api_key: env_opt("GROQ_API_KEY"),
            groq_model: env_or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            ollama_url: env_or("OLLAMA_URL", "http://localhost:11434/api/generate"),
            ollama_model: env_or("OLLAMA_MODEL", "aya:8b"),
            timeout: GENERATION_TIMEOUT,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub dim: usize,
    /// Embedding server endpoint. When unset, the deterministic offline
    /// embedder is used instead.
    pub url: Option<String>,
    pub model: String,
}

impl EmbeddingConfig {
    pub fn from_env() -> Self {
        Self {
            dim: EMBED_DIM,
            url: env_opt("EMBEDDINGS_URL"),
            model: env_or("EMBEDDINGS_MODEL", "all-minilm"),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub sim_threshold: f32,
    pub max_context_articles: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            sim_threshold: SIM_THRESHOLD,
            max_context_articles: MAX_CONTEXT_ARTICLES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub chunk_size: usize,
    pub max_per_source: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_per_source: MAX_PER_SOURCE,
        }
    }
}
