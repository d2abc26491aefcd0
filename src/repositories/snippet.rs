use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::{
    error::{AppError, Result},
    models::snippet::Snippet,
};

/// How many snippets the home page lists.
pub const LATEST_LIMIT: i64 = 10;

/// Storage for snippets. Expired snippets are never returned.
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Inserts a snippet expiring `expires_days` from now and returns its ID.
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64>;

    /// Fetches a non-expired snippet, or `AppError::NoRecord`.
    async fn get(&self, id: i64) -> Result<Snippet>;

    /// The most recently created non-expired snippets, newest first.
    async fn latest(&self) -> Result<Vec<Snippet>>;
}

/// A `SnippetRepository` backed by the `snippets` table.
#[derive(Clone)]
pub struct PostgresSnippetRepository {
    pool: Pool,
}

impl PostgresSnippetRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepository for PostgresSnippetRepository {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO snippets (title, content, created, expires)
                VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
                RETURNING id
                "#,
                &[&title, &content, &expires_days],
            )
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn get(&self, id: i64) -> Result<Snippet> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, title, content, created, expires
                FROM snippets
                WHERE expires > NOW() AND id = $1
                "#,
                &[&id],
            )
            .await?
            .ok_or(AppError::NoRecord)?;
        Ok(Snippet::try_from(&row)?)
    }

    async fn latest(&self) -> Result<Vec<Snippet>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, title, content, created, expires
                FROM snippets
                WHERE expires > NOW()
                ORDER BY id DESC
                LIMIT $1
                "#,
                &[&LATEST_LIMIT],
            )
            .await?;
        rows.iter()
            .map(|row| Snippet::try_from(row).map_err(AppError::from))
            .collect()
    }
}
