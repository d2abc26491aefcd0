use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, SessionBackend};
use crate::error::Result;
use crate::render::templates::TemplateCache;
use crate::repositories::{
    memory::{MemorySessionStore, MemorySnippetRepository, MemoryUserRepository},
    session::{PostgresSessionStore, RedisSessionStore, SessionStore},
    snippet::{PostgresSnippetRepository, SnippetRepository},
    user::{PostgresUserRepository, UserRepository},
};

/// How often the Postgres session store purges expired rows.
pub const SESSION_CLEANUP_PERIOD: Duration = Duration::from_secs(5 * 60);

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<Config>,
    /// The snippet repository.
    pub snippets: Arc<dyn SnippetRepository>,
    /// The user repository.
    pub users: Arc<dyn UserRepository>,
    /// The session store.
    pub sessions: Arc<dyn SessionStore>,
    /// The named pages.
    pub templates: Arc<TemplateCache>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Connects to PostgreSQL, brings the schema up to date and opens the
    /// configured session store. With the Postgres store, a background task
    /// purges expired sessions.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL Pool initialized with deadpool-postgres");

        crate::db::run_migrations(&db).await?;

        let sessions: Arc<dyn SessionStore> = match config.session_store {
            SessionBackend::Postgres => {
                let store = PostgresSessionStore::new(db.clone());
                store.spawn_cleanup(SESSION_CLEANUP_PERIOD);
                tracing::info!("✅ Session store: PostgreSQL (cleanup every 5 minutes)");
                Arc::new(store)
            }
            SessionBackend::Redis => {
                let store = RedisSessionStore::connect(&config.redis_url).await?;
                tracing::info!("✅ Session store: Redis");
                Arc::new(store)
            }
            SessionBackend::Memory => {
                tracing::warn!("⚠️ Session store: memory, sessions are lost on restart");
                Arc::new(MemorySessionStore::new())
            }
        };

        Ok(AppState {
            config: Arc::new(config.clone()),
            snippets: Arc::new(PostgresSnippetRepository::new(db.clone())),
            users: Arc::new(PostgresUserRepository::new(db)),
            sessions,
            templates: Arc::new(TemplateCache::new()),
        })
    }

    /// A state with every store held in memory.
    pub fn in_memory(config: Config) -> Self {
        AppState {
            config: Arc::new(config),
            snippets: Arc::new(MemorySnippetRepository::new()),
            users: Arc::new(MemoryUserRepository::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            templates: Arc::new(TemplateCache::new()),
        }
    }
}
