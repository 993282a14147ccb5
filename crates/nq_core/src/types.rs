use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored news article. `url` is the natural identity: stores treat a
/// duplicate URL as a no-op, so there is exactly one embedding per URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub content: String,
    /// Stored byte encoding of the embedding (see [`crate::embedding`]).
    pub embedding: Vec<u8>,
}

/// An article plus its cosine similarity to a query. Produced only by
/// retrieval, never persisted.
#[derive(Debug, Clone)]
pub struct ScoredArticle {
    pub article: Article,
    pub similarity: f32,
}

#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    pub text: String,
    /// Maximum number of articles returned after ranking.
    pub k: usize,
}

impl RetrievalQuery {
    pub fn new(text: impl Into<String>, k: usize) -> Self {
        Self { text: text.into(), k }
    }
}
