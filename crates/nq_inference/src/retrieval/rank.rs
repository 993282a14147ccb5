use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use nq_core::{Article, ScoredArticle};

/// Seam between ranking and the article shapes that flow through it: scored
/// results on the chat path, plain articles on the digest path.
pub trait SourceRanked {
    fn source(&self) -> &str;
    fn similarity(&self) -> Option<f32>;
    fn published_at(&self) -> DateTime<Utc>;
}

impl SourceRanked for Article {
    fn source(&self) -> &str {
        &self.source
    }

    fn similarity(&self) -> Option<f32> {
        None
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }
}

impl SourceRanked for ScoredArticle {
    fn source(&self) -> &str {
        &self.article.source
    }

    fn similarity(&self) -> Option<f32> {
        Some(self.similarity)
    }

    fn published_at(&self) -> DateTime<Utc> {
        self.article.published_at
    }
}

/// Higher rank = earlier in the output. Unlisted sources rank 0.
fn source_priority(source: &str) -> u8 {
    match source {
        "smol.ai" => 3,
        "TechCrunch" => 2,
        "HuggingFace" => 1,
        _ => 0,
    }
}

fn group_by_source<T: SourceRanked>(items: Vec<T>) -> Vec<(String, Vec<T>)> {
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    for item in items {
        match groups.iter().position(|(source, _)| source == item.source()) {
            Some(i) => groups[i].1.push(item),
            None => groups.push((item.source().to_string(), vec![item])),
        }
    }
    groups
}

/// Two-level sort: partitions by source, orders each partition by similarity
/// descending (when every member carries a score) or recency descending,
/// then emits partitions in descending source priority. Unlisted sources
/// come last, in order of first appearance in the input. Trusted sources
/// therefore lead the context window regardless of their raw scores.
pub fn sort_by_source_priority<T: SourceRanked>(items: Vec<T>) -> Vec<T> {
    let mut groups = group_by_source(items);

    for (_, group) in &mut groups {
        if group.iter().all(|item| item.similarity().is_some()) {
            group.sort_by(|a, b| {
                let (sa, sb) = (a.similarity().unwrap_or(0.0), b.similarity().unwrap_or(0.0));
                sb.partial_cmp(&sa).unwrap_or(Ordering::Equal)
            });
        } else {
            group.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
        }
    }

    // stable sort keeps first-appearance order among equal (unlisted) ranks
    groups.sort_by_key(|(source, _)| std::cmp::Reverse(source_priority(source)));

    groups.into_iter().flat_map(|(_, group)| group).collect()
}

/// Keep at most `max_per_source` articles per source (first wins within a
/// group, which arrives already sorted), then re-sort the union by recency.
/// Stops one prolific source from crowding a digest out.
pub fn cap_per_source<T: SourceRanked>(items: Vec<T>, max_per_source: usize) -> Vec<T> {
    let groups = group_by_source(items);
    let mut capped: Vec<T> = groups
        .into_iter()
        .flat_map(|(_, group)| group.into_iter().take(max_per_source))
        .collect();
    capped.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
    capped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(source: &str, url: &str, days_ago: i64) -> Article {
        Article {
            source: source.to_string(),
            title: format!("Article {url}"),
            author: None,
            published_at: Utc::now() - Duration::days(days_ago),
            url: url.to_string(),
            content: String::new(),
            embedding: Vec::new(),
        }
    }

    fn scored(source: &str, url: &str, similarity: f32) -> ScoredArticle {
        ScoredArticle {
            article: article(source, url, 0),
            similarity,
        }
    }

    #[test]
    fn priority_sources_lead_regardless_of_score() {
        let items = vec![
            scored("TechCrunch", "tc/1", 0.9),
            scored("smol.ai", "smol/1", 0.4),
            scored("smol.ai", "smol/2", 0.6),
        ];

        let sorted = sort_by_source_priority(items);
        let urls: Vec<_> = sorted.iter().map(|s| s.article.url.as_str()).collect();
        // both smol.ai articles first, most similar leading
        assert_eq!(urls, vec!["smol/2", "smol/1", "tc/1"]);
    }

    #[test]
    fn unlisted_sources_trail_in_first_appearance_order() {
        let items = vec![
            scored("AlphaBlog", "alpha/1", 0.99),
            scored("ZetaBlog", "zeta/1", 0.98),
            scored("HuggingFace", "hf/1", 0.2),
        ];

        let sorted = sort_by_source_priority(items);
        let sources: Vec<_> = sorted.iter().map(|s| s.article.source.as_str()).collect();
        assert_eq!(sources, vec!["HuggingFace", "AlphaBlog", "ZetaBlog"]);
    }

    #[test]
    fn unscored_partitions_fall_back_to_recency() {
        let items = vec![
            article("smol.ai", "smol/old", 5),
            article("smol.ai", "smol/new", 1),
        ];

        let sorted = sort_by_source_priority(items);
        let urls: Vec<_> = sorted.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["smol/new", "smol/old"]);
    }

    #[test]
    fn rerank_is_idempotent() {
        let items = vec![
            scored("TechCrunch", "tc/1", 0.9),
            scored("smol.ai", "smol/1", 0.4),
            scored("Unknown", "u/1", 0.5),
        ];

        let once = sort_by_source_priority(items);
        let once_urls: Vec<_> = once.iter().map(|s| s.article.url.clone()).collect();
        let twice = sort_by_source_priority(once);
        let twice_urls: Vec<_> = twice.iter().map(|s| s.article.url.clone()).collect();
        assert_eq!(once_urls, twice_urls);
    }

    #[test]
    fn cap_per_source_bounds_every_source() {
        let items = vec![
            article("smol.ai", "smol/1", 1),
            article("smol.ai", "smol/2", 2),
            article("smol.ai", "smol/3", 3),
            article("TechCrunch", "tc/1", 4),
        ];

        let capped = cap_per_source(items, 2);
        let smol = capped.iter().filter(|a| a.source == "smol.ai").count();
        assert_eq!(smol, 2);
        assert_eq!(capped.len(), 3);
    }

    #[test]
    fn cap_per_source_resorts_by_recency() {
        let items = vec![
            article("smol.ai", "smol/1", 5),
            article("TechCrunch", "tc/1", 1),
        ];

        let capped = cap_per_source(items, 10);
        let urls: Vec<_> = capped.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["tc/1", "smol/1"]);
    }
}
