//! In-process implementations of the repository traits.
//!
//! Used by the test suites and by `SESSION_STORE=memory` for local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    session::{SessionStore, StoredSession},
    snippet::{LATEST_LIMIT, SnippetRepository},
    user::UserRepository,
};
use crate::{
    error::{AppError, Result},
    models::{snippet::Snippet, user::User},
};

#[derive(Clone, Default)]
pub struct MemorySnippetRepository {
    snippets: Arc<RwLock<Vec<Snippet>>>,
}

impl MemorySnippetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snippet as-is, including already-expired ones.
    pub async fn seed(&self, snippet: Snippet) {
        self.snippets.write().await.push(snippet);
    }
}

#[async_trait]
impl SnippetRepository for MemorySnippetRepository {
    async fn insert(&self, title: &str, content: &str, expires_days: i32) -> Result<i64> {
        let mut snippets = self.snippets.write().await;
        let id = snippets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let created = Utc::now();
        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + chrono::Duration::days(i64::from(expires_days)),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet> {
        let now = Utc::now();
        self.snippets
            .read()
            .await
            .iter()
            .find(|s| s.id == id && !s.is_expired(now))
            .cloned()
            .ok_or(AppError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>> {
        let now = Utc::now();
        let mut live: Vec<Snippet> = self
            .snippets
            .read()
            .await
            .iter()
            .filter(|s| !s.is_expired(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| b.id.cmp(&a.id));
        live.truncate(LATEST_LIMIT as usize);
        Ok(live)
    }
}

#[derive(Clone)]
struct StoredUser {
    user: User,
    hashed_password: String,
}

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<Vec<StoredUser>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, name: &str, email: &str, hashed_password: &str) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.user.email == email) {
            return Err(AppError::DuplicateEmail);
        }
        let id = users.iter().map(|u| u.user.id).max().unwrap_or(0) + 1;
        users.push(StoredUser {
            user: User {
                id,
                name: name.to_string(),
                email: email.to_string(),
                created: Utc::now(),
            },
            hashed_password: hashed_password.to_string(),
        });
        Ok(())
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<(i64, String)>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.user.email == email)
            .map(|u| (u.user.id, u.hashed_password.clone())))
    }

    async fn get(&self, id: i64) -> Result<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone())
            .ok_or(AppError::NoRecord)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.users.read().await.iter().any(|u| u.user.id == id))
    }

    async fn update_password(&self, id: i64, hashed_password: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let stored = users
            .iter_mut()
            .find(|u| u.user.id == id)
            .ok_or(AppError::NoRecord)?;
        hashed_password.clone_into(&mut stored.hashed_password);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, StoredSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn find(&self, token: &str) -> Result<Option<StoredSession>> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expiry > now);
        Ok(sessions.get(token).cloned())
    }

    async fn commit(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        self.sessions.write().await.insert(
            token.to_string(),
            StoredSession {
                data: data.to_vec(),
                expiry,
            },
        );
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}
