use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use nq_core::{ArticleStore, Error, Result};
use tracing::{error, info, warn};

use crate::config::SynthesisConfig;
use crate::models::{Backend, LlmGateway};
use crate::retrieval::{cap_per_source, sort_by_source_priority, Retriever};

pub mod messages;
pub mod prompts;

const QA_MAP_TOKENS: u32 = 900;
const QA_REDUCE_TOKENS: u32 = 1200;
const DIGEST_MAP_TOKENS: u32 = 700;
const DIGEST_REDUCE_TOKENS: u32 = 1800;

const DIGEST_HEADER: &str = "WEEKLY AI NEWS SUMMARY";

/// Map-reduce synthesis over retrieved articles. A single combined prompt
/// over many full articles would blow the context budget of every backend,
/// so the article list is partitioned into small chunks, each chunk is
/// analyzed in one generation call, and one final call reduces the partial
/// outputs into a coherent answer or digest.
///
/// The outward contract is "always returns text": errors surface as the
/// localized messages in [`messages`], never as failures past this boundary.
pub struct Synthesizer {
    store: Arc<dyn ArticleStore>,
    retriever: Retriever,
    gateway: Arc<LlmGateway>,
    config: SynthesisConfig,
}

impl fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synthesizer")
            .field("gateway", &self.gateway)
            .field("config", &self.config)
            .finish()
    }
}

impl Synthesizer {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        retriever: Retriever,
        gateway: Arc<LlmGateway>,
        config: SynthesisConfig,
    ) -> Self {
        Self { store, retriever, gateway, config }
    }

    /// Answer a question from retrieved articles.
    pub async fn answer_question(&self, question: &str, backend: Backend) -> String {
        match self.try_answer(question, backend).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "question answering failed");
                messages::QA_FAILED.to_string()
            }
        }
    }

    /// Digest of the articles published in the last `days` days.
    pub async fn summarize_period(&self, days: i64, backend: Backend) -> String {
        match self.try_summarize(days, backend).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "digest generation failed");
                messages::DIGEST_FAILED.to_string()
            }
        }
    }

    async fn try_answer(&self, question: &str, backend: Backend) -> Result<String> {
        let matches = self.retriever.search(question).await;
        info!(matches = matches.len(), "retrieved articles for question");
        if matches.is_empty() {
            return Ok(messages::NO_RELEVANT_ARTICLES.to_string());
        }

        let chunk_prompts: Vec<String> = matches
            .chunks(self.config.chunk_size)
            .map(|chunk| prompts::chunk_answer_prompt(chunk, question))
            .collect();
        let analyses = self.run_map_phase(backend, &chunk_prompts, QA_MAP_TOKENS).await?;

        let reduce_prompt = prompts::reduce_answer_prompt(&analyses.join("\n\n"), question);
        let answer = self
            .gateway
            .generate(backend, &reduce_prompt, QA_REDUCE_TOKENS)
            .await?;
        if answer.trim().is_empty() {
            return Ok(messages::QA_FAILED.to_string());
        }
        Ok(answer)
    }

    async fn try_summarize(&self, days: i64, backend: Backend) -> Result<String> {
        let articles = self.store.fetch_recent(days).await?;
        info!(count = articles.len(), days, "fetched articles for digest");
        if articles.is_empty() {
            return Ok(messages::NO_RECENT_NEWS.to_string());
        }

        let articles = sort_by_source_priority(articles);
        let articles = cap_per_source(articles, self.config.max_per_source);

        let chunk_prompts: Vec<String> = articles
            .chunks(self.config.chunk_size)
            .map(prompts::chunk_digest_prompt)
            .collect();
        let summaries = self
            .run_map_phase(backend, &chunk_prompts, DIGEST_MAP_TOKENS)
            .await?;

        let today = Utc::now().date_naive().to_string();
        let reduce_prompt = prompts::reduce_digest_prompt(&summaries.join("\n\n"), &today);
        let summary = self
            .gateway
            .generate(backend, &reduce_prompt, DIGEST_REDUCE_TOKENS)
            .await?;
        if summary.trim().is_empty() {
            return Ok(messages::DIGEST_FAILED.to_string());
        }

        // stable, parseable prefix for downstream consumers
        if summary.starts_with(DIGEST_HEADER) {
            Ok(summary)
        } else {
            Ok(format!("{DIGEST_HEADER} - {today}\n\n{summary}"))
        }
    }

    /// One generation call per chunk, issued concurrently. Outputs come back
    /// in chunk order whatever the completion order; a failed chunk is
    /// skipped, all chunks failing is an overall failure.
    async fn run_map_phase(
        &self,
        backend: Backend,
        chunk_prompts: &[String],
        max_tokens: u32,
    ) -> Result<Vec<String>> {
        let calls = chunk_prompts
            .iter()
            .map(|prompt| self.gateway.generate(backend, prompt, max_tokens));
        let results = join_all(calls).await;

        let mut partials = Vec::with_capacity(results.len());
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(text) => partials.push(text.trim().to_string()),
                Err(e) => warn!(chunk = i, error = %e, "map chunk failed, skipping"),
            }
        }
        if partials.is_empty() {
            return Err(Error::Transport("all map chunks failed".to_string()));
        }
        Ok(partials)
    }
}
