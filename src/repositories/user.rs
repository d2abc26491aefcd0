use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::error::SqlState;

use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// Name of the unique constraint on `users.email`.
const EMAIL_CONSTRAINT: &str = "users_uc_email";

/// Storage for user accounts.
///
/// Works on already-hashed passwords; hashing happens in `services::users`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user, failing with `AppError::DuplicateEmail` if the email is taken.
    async fn insert(&self, name: &str, email: &str, hashed_password: &str) -> Result<()>;

    /// The ID and password hash of the user with `email`, if any.
    async fn credentials_by_email(&self, email: &str) -> Result<Option<(i64, String)>>;

    /// Fetches a user, or `AppError::NoRecord`.
    async fn get(&self, id: i64) -> Result<User>;

    async fn exists(&self, id: i64) -> Result<bool>;

    /// Overwrites the stored hash, or `AppError::NoRecord` if there is no such user.
    async fn update_password(&self, id: i64, hashed_password: &str) -> Result<()>;
}

/// A `UserRepository` backed by the `users` table.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool,
}

impl PostgresUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn is_duplicate_email(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNIQUE_VIOLATION)
        && err
            .as_db_error()
            .and_then(|db| db.constraint())
            .is_some_and(|name| name == EMAIL_CONSTRAINT)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, name: &str, email: &str, hashed_password: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO users (name, email, hashed_password, created)
                VALUES ($1, $2, $3, NOW())
                "#,
                &[&name, &email, &hashed_password],
            )
            .await
            .map_err(|e| {
                if is_duplicate_email(&e) {
                    AppError::DuplicateEmail
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<(i64, String)>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, hashed_password FROM users WHERE email = $1",
                &[&email],
            )
            .await?;
        match row {
            Some(row) => Ok(Some((row.try_get("id")?, row.try_get("hashed_password")?))),
            None => Ok(None),
        }
    }

    async fn get(&self, id: i64) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, email, created FROM users WHERE id = $1",
                &[&id],
            )
            .await?
            .ok_or(AppError::NoRecord)?;
        Ok(User::try_from(&row)?)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("SELECT EXISTS(SELECT true FROM users WHERE id = $1)", &[&id])
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn update_password(&self, id: i64, hashed_password: &str) -> Result<()> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE users SET hashed_password = $1 WHERE id = $2",
                &[&hashed_password, &id],
            )
            .await?;
        if updated == 0 {
            return Err(AppError::NoRecord);
        }
        Ok(())
    }
}
