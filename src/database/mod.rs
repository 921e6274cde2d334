use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

pub mod conflict;
pub mod constraints;
pub mod models;
pub mod repos;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Full schema, applied by `catalog init-db`. Constraint names here must
/// stay in sync with `constraints.rs`.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Build the connection pool from DATABASE_URL
pub async fn connect(config: &AppConfig) -> Result<PgPool, DatabaseError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
    if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
        return Err(DatabaseError::InvalidDatabaseUrl);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&url)
        .await?;

    info!("Created database pool ({} max connections)", config.database.max_connections);
    Ok(pool)
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the bundled schema, statement by statement. Idempotent: every
/// statement uses IF NOT EXISTS.
pub async fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in SCHEMA_SQL.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Schema applied");
    Ok(())
}
