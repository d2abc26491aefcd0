use std::sync::LazyLock;

use zeroize::Zeroizing;

use crate::crypto::password::{hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::repositories::user::UserRepository;

/// Hash checked when the email is unknown, so that failure takes as long as a
/// wrong password does.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("snippetbox-timing-equaliser").ok());

/// Hashes `password` on the blocking pool, off the runtime workers.
async fn hash_off_runtime(password: &str) -> Result<String> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}

/// Verifies `password` on the blocking pool.
///
/// With no stored hash, the dummy hash is checked instead and the result is
/// always `false`.
async fn verify_off_runtime(password: &str, hash: Option<String>) -> Result<bool> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                verify_password(&password, dummy)?;
            }
            Ok(false)
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("password verification task failed: {}", e)))?
}

/// Creates a new user.
///
/// # Arguments
///
/// * `users` - The user repository.
/// * `name` - The user's display name.
/// * `email` - The user's email address.
/// * `password` - The plaintext password; only its hash is stored.
///
/// # Returns
///
/// `Ok(())`, or `AppError::DuplicateEmail` if the email is already registered.
pub async fn create_user(
    users: &dyn UserRepository,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    tracing::debug!("🔐 Creating user: {}", email);
    let hashed_password = hash_off_runtime(password).await?;
    users.insert(name, email, &hashed_password).await?;
    tracing::info!("✅ User created: {}", email);
    Ok(())
}

/// Authenticates a user.
///
/// # Arguments
///
/// * `users` - The user repository.
/// * `email` - The user's email address.
/// * `password` - The candidate password.
///
/// # Returns
///
/// The user's ID, or `AppError::InvalidCredentials` whether the email is
/// unknown or the password is wrong.
pub async fn authenticate(users: &dyn UserRepository, email: &str, password: &str) -> Result<i64> {
    let (id, hashed_password) = users.credentials_by_email(email).await?.unzip();

    let matched = verify_off_runtime(password, hashed_password).await?;
    let Some(id) = id.filter(|_| matched) else {
        return Err(AppError::InvalidCredentials);
    };

    tracing::debug!("✅ User authenticated: {}", id);
    Ok(id)
}

/// Fetches a user by ID.
pub async fn get_user(users: &dyn UserRepository, id: i64) -> Result<User> {
    users.get(id).await
}

/// Replaces a user's password with a hash of `new_password`.
pub async fn update_password(users: &dyn UserRepository, id: i64, new_password: &str) -> Result<()> {
    let hashed_password = hash_off_runtime(new_password).await?;
    users.update_password(id, &hashed_password).await
}

/// Changes a user's password after re-checking the current one.
///
/// # Returns
///
/// `AppError::InvalidCredentials` if `current_password` is wrong,
/// `AppError::NoRecord` if the user no longer exists.
pub async fn change_password(
    users: &dyn UserRepository,
    id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    tracing::info!("🔑 Changing password for user: {}", id);

    let user = users.get(id).await?;
    authenticate(users, &user.email, current_password).await?;
    update_password(users, id, new_password).await?;

    tracing::info!("✅ Password changed for user: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryUserRepository;

    #[tokio::test]
    async fn correct_credentials_return_the_id() {
        let repo = MemoryUserRepository::new();
        create_user(&repo, "Alice", "alice@example.com", "pa$$word").await.unwrap();

        let id = authenticate(&repo, "alice@example.com", "pa$$word").await.unwrap();
        assert_eq!(get_user(&repo, id).await.unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let repo = MemoryUserRepository::new();
        create_user(&repo, "Alice", "alice@example.com", "pa$$word").await.unwrap();

        let wrong_password = authenticate(&repo, "alice@example.com", "not-it").await;
        let unknown_email = authenticate(&repo, "nobody@example.com", "pa$$word").await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
        assert_eq!(
            wrong_password.unwrap_err().to_string(),
            unknown_email.unwrap_err().to_string()
        );
    }

    #[tokio::test]
    async fn password_change_requires_current_password() {
        let repo = MemoryUserRepository::new();
        create_user(&repo, "Alice", "alice@example.com", "old-password").await.unwrap();
        let id = authenticate(&repo, "alice@example.com", "old-password").await.unwrap();

        assert!(matches!(
            change_password(&repo, id, "guess", "new-password").await,
            Err(AppError::InvalidCredentials)
        ));

        change_password(&repo, id, "old-password", "new-password").await.unwrap();
        assert!(authenticate(&repo, "alice@example.com", "old-password").await.is_err());
        assert_eq!(
            authenticate(&repo, "alice@example.com", "new-password").await.unwrap(),
            id
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn hashing_leaves_the_runtime_free() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        let repo = MemoryUserRepository::new();
        create_user(&repo, "Alice", "alice@example.com", "pa$$word").await.unwrap();
        assert!(ticks.load(Ordering::SeqCst) > 0, "other tasks must run while hashing");

        let before = ticks.load(Ordering::SeqCst);
        authenticate(&repo, "nobody@example.com", "pa$$word").await.unwrap_err();
        assert!(ticks.load(Ordering::SeqCst) > before);

        ticker.abort();
    }

    #[tokio::test]
    async fn updating_a_missing_user_is_no_record() {
        let repo = MemoryUserRepository::new();
        assert!(matches!(
            update_password(&repo, 99, "new-password").await,
            Err(AppError::NoRecord)
        ));
    }
}
