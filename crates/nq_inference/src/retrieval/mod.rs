use std::collections::BTreeMap;
use std::sync::Arc;

use nq_core::embedding::bytes_to_vec;
use nq_core::{ArticleStore, Result, RetrievalQuery, ScoredArticle};
use tracing::{error, info, warn};

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingGateway;

pub mod rank;

pub use rank::{cap_per_source, sort_by_source_priority, SourceRanked};

/// Cosine similarity of two equal-length vectors. A zero-norm operand
/// yields 0.0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (dot / denom) as f32
}

/// Similarity search over the whole corpus: embed the query, score every
/// candidate, threshold, re-rank by source priority, truncate to `k`.
pub struct Retriever {
    store: Arc<dyn ArticleStore>,
    embeddings: Arc<EmbeddingGateway>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        embeddings: Arc<EmbeddingGateway>,
        config: RetrievalConfig,
    ) -> Self {
        Self { store, embeddings, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve with the configured default `k`.
    pub async fn search(&self, text: &str) -> Vec<ScoredArticle> {
        self.retrieve(&RetrievalQuery::new(text, self.config.max_context_articles))
            .await
    }

    /// Best effort: storage or embedding failures degrade to an empty result
    /// and a log line, never a hard failure for the caller.
    pub async fn retrieve(&self, query: &RetrievalQuery) -> Vec<ScoredArticle> {
        match self.try_retrieve(query).await {
            Ok(matches) => matches,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &RetrievalQuery) -> Result<Vec<ScoredArticle>> {
        let articles = self.store.fetch_all().await?;
        if articles.is_empty() {
            warn!("no articles in store");
            return Ok(Vec::new());
        }

        let query_vec = self.embeddings.embed(&query.text).await?;
        let dim = self.embeddings.dim();

        let mut matches = Vec::new();
        for article in articles {
            let vec = match bytes_to_vec(&article.embedding, dim) {
                Ok(vec) => vec,
                Err(e) => {
                    warn!(url = %article.url, error = %e, "skipping article with corrupt embedding");
                    continue;
                }
            };
            let similarity = cosine_similarity(&query_vec, &vec);
            if similarity < self.config.sim_threshold {
                continue;
            }
            matches.push(ScoredArticle { article, similarity });
        }

        let mut matches = sort_by_source_priority(matches);
        matches.truncate(query.k);

        let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
        for m in &matches {
            *distribution.entry(m.article.source.as_str()).or_default() += 1;
        }
        info!(
            query = %query.text.chars().take(50).collect::<String>(),
            matches = matches.len(),
            distribution = ?distribution,
            "retrieval complete"
        );

        Ok(matches)
    }
}
