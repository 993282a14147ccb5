use async_trait::async_trait;

use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Store an article. Inserting a URL that already exists is a no-op.
    async fn store_article(&self, article: &Article) -> Result<()>;

    /// All articles, most recent first.
    async fn fetch_all(&self) -> Result<Vec<Article>>;

    /// Articles published within the last `days` days, most recent first.
    async fn fetch_recent(&self, days: i64) -> Result<Vec<Article>>;
}
