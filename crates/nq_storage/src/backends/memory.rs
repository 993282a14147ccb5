use async_trait::async_trait;
use chrono::{Duration, Utc};
use nq_core::{Article, ArticleStore, Result};
use tokio::sync::RwLock;

/// In-memory article store. Used by tests and for ad-hoc runs without a
/// database; the read path behaves exactly like the persistent backends.
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_desc(mut articles: Vec<Article>) -> Vec<Article> {
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        articles
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn store_article(&self, article: &Article) -> Result<()> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|a| a.url == article.url) {
            return Ok(());
        }
        articles.push(article.clone());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Article>> {
        let articles = self.articles.read().await;
        Ok(Self::sorted_desc(articles.clone()))
    }

    async fn fetch_recent(&self, days: i64) -> Result<Vec<Article>> {
        let since = Utc::now() - Duration::days(days);
        let articles = self.articles.read().await;
        Ok(Self::sorted_desc(
            articles
                .iter()
                .filter(|a| a.published_at >= since)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, days_ago: i64) -> Article {
        Article {
            source: "test".to_string(),
            title: format!("Article {url}"),
            author: Some("Test Author".to_string()),
            published_at: Utc::now() - Duration::days(days_ago),
            url: url.to_string(),
            content: "This is a test article.".to_string(),
            embedding: vec![0; 16],
        }
    }

    #[tokio::test]
    async fn duplicate_url_is_a_noop() {
        let store = MemoryStore::new();
        let first = article("http://test.com/a", 1);
        let mut second = first.clone();
        second.title = "Changed".to_string();

        store.store_article(&first).await.unwrap();
        store.store_article(&second).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, first.title);
    }

    #[tokio::test]
    async fn fetch_all_is_recency_descending() {
        let store = MemoryStore::new();
        store.store_article(&article("http://test.com/old", 5)).await.unwrap();
        store.store_article(&article("http://test.com/new", 1)).await.unwrap();
        store.store_article(&article("http://test.com/mid", 3)).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        let urls: Vec<_> = all.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["http://test.com/new", "http://test.com/mid", "http://test.com/old"]);
    }

    #[tokio::test]
    async fn fetch_recent_honors_the_window() {
        let store = MemoryStore::new();
        store.store_article(&article("http://test.com/old", 10)).await.unwrap();
        store.store_article(&article("http://test.com/new", 2)).await.unwrap();

        let recent = store.fetch_recent(7).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].url, "http://test.com/new");
    }
}
