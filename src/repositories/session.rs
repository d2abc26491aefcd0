use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;

use crate::error::Result;

/// A session as persisted by a store: the encoded data bag and its deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub data: Vec<u8>,
    pub expiry: DateTime<Utc>,
}

/// Token-keyed persistence for session data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for `token` unless it is missing or expired.
    async fn find(&self, token: &str) -> Result<Option<StoredSession>>;

    /// Inserts or replaces the session for `token`.
    async fn commit(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()>;

    async fn delete(&self, token: &str) -> Result<()>;
}

/// A `SessionStore` backed by the `sessions` table.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: Pool,
}

impl PostgresSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Deletes every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM sessions WHERE expiry < current_timestamp", &[])
            .await?;
        Ok(deleted)
    }

    /// Spawns a task that purges expired sessions every `period`.
    pub fn spawn_cleanup(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(count) => tracing::info!("🧹 Purged {} expired sessions", count),
                    Err(e) => tracing::error!("❌ Session cleanup failed: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn find(&self, token: &str) -> Result<Option<StoredSession>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT data, expiry FROM sessions WHERE token = $1 AND current_timestamp < expiry",
                &[&token],
            )
            .await?;
        match row {
            Some(row) => Ok(Some(StoredSession {
                data: row.try_get("data")?,
                expiry: row.try_get("expiry")?,
            })),
            None => Ok(None),
        }
    }

    async fn commit(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO sessions (token, data, expiry) VALUES ($1, $2, $3)
                ON CONFLICT (token) DO UPDATE SET data = EXCLUDED.data, expiry = EXCLUDED.expiry
                "#,
                &[&token, &data, &expiry],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute("DELETE FROM sessions WHERE token = $1", &[&token])
            .await?;
        Ok(())
    }
}

/// A `SessionStore` keeping each session in a Redis key that expires with it.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { redis })
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn find(&self, token: &str) -> Result<Option<StoredSession>> {
        let key = Self::key(token);
        let (data, ttl_ms): (Option<Vec<u8>>, i64) = redis::pipe()
            .cmd("GET")
            .arg(&key)
            .cmd("PTTL")
            .arg(&key)
            .query_async(&mut self.redis.clone())
            .await?;

        // PTTL is negative for missing keys and keys without a TTL.
        match data {
            Some(data) if ttl_ms > 0 => Ok(Some(StoredSession {
                data,
                expiry: Utc::now() + chrono::Duration::milliseconds(ttl_ms),
            })),
            _ => Ok(None),
        }
    }

    async fn commit(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        let ttl_ms = (expiry - Utc::now()).num_milliseconds();
        if ttl_ms <= 0 {
            return self.delete(token).await;
        }

        let _: () = redis::cmd("SET")
            .arg(Self::key(token))
            .arg(data)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut self.redis.clone())
            .await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let _: () = redis::cmd("DEL")
            .arg(Self::key(token))
            .query_async(&mut self.redis.clone())
            .await?;
        Ok(())
    }
}
