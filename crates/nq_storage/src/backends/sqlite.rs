use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use nq_core::{Article, ArticleStore, Error, Result};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        title TEXT NOT NULL,
        author TEXT,
        published_ts INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_ts)",
    "CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source)",
];

const SELECT_COLUMNS: &str = "source, title, author, published_ts, url, content, embedding";

pub struct SqliteStore {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SqliteStore {
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePool::connect(&format!("sqlite://{}?mode=rwc", db_path.display()))
            .await
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("failed to run migration {i}: {e}")))?;
        }

        tracing::debug!(path = %db_path.display(), "article database opened");
        Ok(Self { pool, db_path: db_path.to_path_buf() })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_article(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
        let published_ts: i64 = row
            .try_get("published_ts")
            .map_err(|e| Error::Storage(e.to_string()))?;
        let published_at = DateTime::from_timestamp(published_ts, 0)
            .ok_or_else(|| Error::CorruptData(format!("invalid published_ts {published_ts}")))?;

        Ok(Article {
            source: row.try_get("source").map_err(|e| Error::Storage(e.to_string()))?,
            title: row.try_get("title").map_err(|e| Error::Storage(e.to_string()))?,
            author: row.try_get("author").map_err(|e| Error::Storage(e.to_string()))?,
            published_at,
            url: row.try_get("url").map_err(|e| Error::Storage(e.to_string()))?,
            content: row.try_get("content").map_err(|e| Error::Storage(e.to_string()))?,
            embedding: row.try_get("embedding").map_err(|e| Error::Storage(e.to_string()))?,
        })
    }

    fn rows_to_articles(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Article>> {
        rows.iter().map(Self::row_to_article).collect()
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn store_article(&self, article: &Article) -> Result<()> {
        // OR IGNORE keeps ingestion idempotent on the URL key.
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (url, source, title, author, published_ts, content, embedding)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.url)
        .bind(&article.source)
        .bind(&article.title)
        .bind(&article.author)
        .bind(article.published_at.timestamp())
        .bind(&article.content)
        .bind(&article.embedding)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to store article: {e}")))?;

        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles ORDER BY published_ts DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to fetch articles: {e}")))?;

        Self::rows_to_articles(rows)
    }

    async fn fetch_recent(&self, days: i64) -> Result<Vec<Article>> {
        let since = (Utc::now() - Duration::days(days)).timestamp();
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles WHERE published_ts >= ? ORDER BY published_ts DESC"
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("failed to fetch recent articles: {e}")))?;

        Self::rows_to_articles(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, days_ago: i64) -> Article {
        Article {
            source: "test".to_string(),
            title: format!("Article {url}"),
            author: None,
            published_at: Utc::now() - Duration::days(days_ago),
            url: url.to_string(),
            content: "This is a test article.".to_string(),
            embedding: vec![1, 2, 3, 4],
        }
    }

    async fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("news.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn store_and_fetch_round_trip() {
        let (_dir, store) = open_temp().await;
        let a = article("http://test.com/a", 1);
        store.store_article(&a).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].url, a.url);
        assert_eq!(all[0].embedding, a.embedding);
        // second-granularity timestamps survive the round trip
        assert_eq!(all[0].published_at.timestamp(), a.published_at.timestamp());
    }

    #[tokio::test]
    async fn duplicate_url_is_a_noop() {
        let (_dir, store) = open_temp().await;
        let a = article("http://test.com/a", 1);
        let mut b = a.clone();
        b.title = "Changed".to_string();

        store.store_article(&a).await.unwrap();
        store.store_article(&b).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, a.title);
    }

    #[tokio::test]
    async fn fetch_recent_honors_the_window() {
        let (_dir, store) = open_temp().await;
        store.store_article(&article("http://test.com/old", 10)).await.unwrap();
        store.store_article(&article("http://test.com/new", 2)).await.unwrap();

        let recent = store.fetch_recent(7).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].url, "http://test.com/new");
    }
}
