pub mod config;
pub mod embeddings;
pub mod models;
pub mod retrieval;
pub mod synthesis;

pub use config::{EmbeddingConfig, LlmConfig, RetrievalConfig, SynthesisConfig};
pub use embeddings::EmbeddingGateway;
pub use models::{Backend, LlmGateway};
pub use retrieval::Retriever;
pub use synthesis::Synthesizer;

pub mod prelude {
    pub use super::config::{EmbeddingConfig, LlmConfig, RetrievalConfig, SynthesisConfig};
    pub use super::embeddings::{EmbeddingGateway, EmbeddingModel};
    pub use super::models::{Backend, LlmGateway, LlmModel};
    pub use super::retrieval::{cap_per_source, sort_by_source_priority, Retriever};
    pub use super::synthesis::Synthesizer;
    pub use nq_core::{Article, Error, Result, RetrievalQuery, ScoredArticle};
}
