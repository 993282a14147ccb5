//! Prompt construction for the map and reduce phases. Article content is
//! truncated to a fixed character budget before it enters any prompt.

use nq_core::{Article, ScoredArticle};

const CONTENT_BUDGET: usize = 2000;

/// Truncate to `max` characters without splitting a UTF-8 code point.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn format_article_for_context(scored: &ScoredArticle) -> String {
    let article = &scored.article;
    format!(
        "Title: {}\nSource: {}\nDate: {}\nAuthor: {}\nContent: {}...\nURL: {}\n",
        article.title,
        article.source,
        article.published_at.format("%Y-%m-%d"),
        article.author.as_deref().unwrap_or("Unknown"),
        truncate_chars(&article.content, CONTENT_BUDGET),
        article.url,
    )
}

pub(crate) fn chunk_answer_prompt(chunk: &[ScoredArticle], question: &str) -> String {
    let articles = chunk
        .iter()
        .map(format_article_for_context)
        .collect::<Vec<_>>()
        .join("\n---\n");
    format!(
        "You are an expert AI news analyst. Given the following articles, answer the user's \
         question in detail, synthesizing information from all relevant articles. Dive deep into \
         the content, provide explanations, and reference specific points, arguments, or \
         findings. Avoid superficial answers.\n\n\
         Articles:\n{articles}\n\n\
         Question:\n{question}\n\n\
         Detailed, content-rich answer (with as much detail as possible):"
    )
}

pub(crate) fn reduce_answer_prompt(analyses: &str, question: &str) -> String {
    format!(
        "You are an expert AI news analyst. Given the following detailed analyses of news \
         articles, synthesize a final, deep, content-rich answer to the user's question. Dive \
         into the details, provide explanations, and reference specific points, arguments, or \
         findings. Avoid superficial answers.\n\n\
         Analyses:\n{analyses}\n\n\
         Question:\n{question}\n\n\
         Final, comprehensive answer:"
    )
}

pub(crate) fn chunk_digest_prompt(chunk: &[Article]) -> String {
    let content = chunk
        .iter()
        .map(|a| format!("{}\n{}", a.title, truncate_chars(&a.content, CONTENT_BUDGET)))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Summarize the following AI news articles from the past week.\n\n\
         Write detailed bullet points for each major highlight, insight, or development.\n\
         Do NOT include source citations or URLs.\n\n\
         News Content:\n{content}\n"
    )
}

pub(crate) fn reduce_digest_prompt(summaries: &str, date: &str) -> String {
    format!(
        "WEEKLY AI NEWS SUMMARY - {date}\n\n\
         Read the following summaries of AI news from the past 7 days.\n\n\
         - Write at least 20 detailed bullet points, each covering a distinct news highlight, \
         insight, or development.\n\
         - Each bullet point should be detailed and reflect the depth of the news, not just \
         headlines.\n\
         - Cover all major topics, trends, and events.\n\
         - Do NOT include source citations or URLs.\n\
         - The summary should be comprehensive and easy to scan.\n\n\
         Chunk Summaries:\n{summaries}\n"
    )
}
