use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};
use thiserror::Error;

/// Persistence failure. Per-call: the coordinator records it and moves on.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(#[from] sqlx::Error);

/// A stored article. `url` is the dedup identity; `id` is the surrogate
/// key the detail view links by.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub category: String,
    pub published: String,
}

impl Article {
    /// Human-readable publication date for the templates.
    pub fn published_display(&self) -> String {
        DateTime::parse_from_rfc3339(&self.published)
            .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
            .unwrap_or_else(|_| self.published.clone())
    }
}

/// A normalized article ready for upsert; everything except the
/// storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub source: Option<String>,
    pub category: String,
    pub published: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    Inserted,
    Updated,
}

/// Read-side filter: substring match over title/description, exact match
/// over category.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT,
                image_url TEXT,
                source TEXT,
                category TEXT NOT NULL,
                published TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_published
            ON articles(published DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_category
            ON articles(category)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert-or-update keyed by url. Re-ingesting the same identity
    /// overwrites all mutable fields in place; it never creates a second row.
    pub async fn upsert_article(&self, article: &NewArticle) -> Result<UpsertResult, StorageError> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE url = ?")
            .bind(&article.url)
            .fetch_optional(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO articles (url, title, description, image_url, source, category, published)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url,
                source = excluded.source,
                category = excluded.category,
                published = excluded.published
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.image_url)
        .bind(&article.source)
        .bind(&article.category)
        .bind(article.published.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(if existing.is_some() {
            UpsertResult::Updated
        } else {
            UpsertResult::Inserted
        })
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>, StorageError> {
        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    /// Distinct categories present in storage, for the filter dropdown.
    pub async fn list_categories(&self) -> Result<Vec<String>, StorageError> {
        let categories =
            sqlx::query_scalar("SELECT DISTINCT category FROM articles ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    /// Filtered page of articles, newest first, plus the total match count.
    pub async fn query_articles(
        &self,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Article>, i64), StorageError> {
        let mut where_sql = String::from("1=1");
        let pattern = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));
        if pattern.is_some() {
            where_sql.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
            );
        }
        let category = filter.category.as_deref().filter(|c| !c.is_empty());
        if category.is_some() {
            where_sql.push_str(" AND category = ?");
        }

        let count_sql = format!("SELECT COUNT(*) FROM articles WHERE {}", where_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p).bind(p);
        }
        if let Some(c) = category {
            count_query = count_query.bind(c);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT * FROM articles WHERE {} ORDER BY published DESC, id DESC LIMIT ? OFFSET ?",
            where_sql
        );
        let mut select_query = sqlx::query_as::<_, Article>(&select_sql);
        if let Some(p) = &pattern {
            select_query = select_query.bind(p).bind(p);
        }
        if let Some(c) = category {
            select_query = select_query.bind(c);
        }
        let articles = select_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((articles, total))
    }
}

/// Escape LIKE wildcards in user-supplied search text so `%` and `_`
/// match literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
