use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::database::memory::MemoryStore;
use crate::database::postgres::PgStore;
use crate::database::SharedStore;

/// Errors raised by the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    /// The store refused the data it was given (constraint or data errors)
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// True when the store rejected the request itself rather than failing
    /// to serve it. Postgres classes 22 (data exception) and 23 (integrity
    /// constraint violation) count as rejections.
    pub fn is_rejection(&self) -> bool {
        match self {
            StoreError::Rejected(_) => true,
            StoreError::Sqlx(sqlx::Error::Database(db_err)) => db_err
                .code()
                .map(|code| code.starts_with("22") || code.starts_with("23"))
                .unwrap_or(false),
            _ => false,
        }
    }
}

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS posts (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        author UUID,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS posts_author_idx ON posts (author)",
    "CREATE INDEX IF NOT EXISTS posts_created_at_idx ON posts (created_at, id)",
    r#"CREATE TABLE IF NOT EXISTS comments (
        id UUID PRIMARY KEY,
        content TEXT NOT NULL,
        author UUID NOT NULL,
        post_id UUID NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    "CREATE INDEX IF NOT EXISTS comments_post_idx ON comments (post_id, created_at, id)",
];

/// Builds the store handle shared by every request
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect the configured backend. Without a database URL the
    /// in-memory store is used.
    pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore, StoreError> {
        match &config.url {
            Some(url) => {
                let pool = Self::pool(config, url).await?;
                if config.auto_migrate {
                    Self::bootstrap_schema(&pool).await?;
                }
                info!(max_connections = config.max_connections, "Connected to postgres store");
                Ok(Arc::new(PgStore::new(pool)))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Create the tables without starting the server
    pub async fn migrate(config: &DatabaseConfig) -> Result<(), StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let pool = Self::pool(config, url).await?;
        Self::bootstrap_schema(&pool).await
    }

    async fn pool(config: &DatabaseConfig, url: &str) -> Result<PgPool, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        Ok(pool)
    }

    async fn bootstrap_schema(pool: &PgPool) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Store schema is up to date");
        Ok(())
    }
}
