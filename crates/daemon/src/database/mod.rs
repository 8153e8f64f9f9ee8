use std::ops::Deref;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use url::Url;

mod account_queries;
mod file_queries;

/// SQLite handle backing both the account table and the file catalog.
#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    /// Open (creating if needed) the database at `url` and run migrations.
    ///
    /// `sqlite::memory:` gives a private in-memory database. Every pooled
    /// connection would see its own empty database, so the pool is pinned
    /// to a single connection that is never recycled.
    pub async fn connect(url: &Url) -> Result<Self, DatabaseSetupError> {
        let in_memory = url.as_str().contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url.as_str())?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        let db = Self(pool);
        db.run_migrations().await?;
        Ok(db)
    }

    /// Idempotent schema setup.
    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                username TEXT PRIMARY KEY NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.0)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                owner TEXT NOT NULL,
                filename TEXT NOT NULL,
                content_type TEXT NOT NULL,
                content_length INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (owner, filename)
            )
            "#,
        )
        .execute(&self.0)
        .await?;

        Ok(())
    }

    /// Cheap round trip used by the readiness route.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.0).await?;
        Ok(())
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// True when `err` is the database rejecting a duplicate key.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Wrap a conversion failure on a stored value as a decode error.
pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("failed to open database: {0}")]
    Connect(#[from] sqlx::Error),
}
