use crate::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when working with the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool: {0}")]
    PoolCreation(sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Writers wait this long for the SQLite write lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a SQLite connection pool
///
/// File databases are created when missing and run in WAL mode. An in-memory
/// database is private to its connection, so the pool is pinned to exactly
/// one connection that is never recycled.
///
/// # Arguments
/// * `config` - Database configuration
///
/// # Returns
/// * `Ok(SqlitePool)` - Successfully created connection pool
/// * `Err(DatabaseError)` - Error creating the pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    config.validate().map_err(DatabaseError::Config)?;

    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(DatabaseError::PoolCreation)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    // Test the connection
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(DatabaseError::PoolCreation)?;

    Ok(pool)
}

/// Run database migrations
///
/// Every migration uses `IF NOT EXISTS`, so this is safe on every startup.
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `migrations_path` - Directory to load migrations from at runtime;
///   `None` uses the set embedded at compile time
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations_path: Option<&str>,
) -> Result<(), DatabaseError> {
    match migrations_path {
        Some(path) => {
            let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(path))
                .await
                .map_err(DatabaseError::Migration)?;
            migrator.run(pool).await.map_err(DatabaseError::Migration)?;
        }
        None => {
            sqlx::migrate!("./migrations")
                .run(pool)
                .await
                .map_err(DatabaseError::Migration)?;
        }
    }

    Ok(())
}
