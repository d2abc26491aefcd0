use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// A short piece of text that stops being visible once it expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// The unique identifier for the snippet.
    pub id: i64,
    /// The snippet's title, at most 100 characters.
    pub title: String,
    /// The snippet's body.
    pub content: String,
    /// The timestamp when the snippet was created.
    pub created: DateTime<Utc>,
    /// The timestamp after which the snippet is no longer returned.
    pub expires: DateTime<Utc>,
}

impl Snippet {
    /// Whether the snippet is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}

impl TryFrom<&Row> for Snippet {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            created: row.try_get("created")?,
            expires: row.try_get("expires")?,
        })
    }
}
