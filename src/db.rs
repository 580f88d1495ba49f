use std::time::Duration;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Failure talking to the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,
    /// Connection-level failure; expected to clear on retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict;
                }
                // SQLSTATE class 08 is connection exception, 57P0x is server shutdown.
                let transient = db_err
                    .code()
                    .map(|c| c.starts_with("08") || c.starts_with("57P0"))
                    .unwrap_or(false);
                if transient {
                    StoreError::Unavailable(err.to_string())
                } else {
                    StoreError::Query(err.to_string())
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

/// Creates the pool without connecting, so the process starts even when the
/// database is down. Connection errors then surface per request.
pub fn connect_lazy(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .connect_lazy(&cfg.url)
        .context("parse DATABASE_URL")
}

/// Applies pending migrations. Failures are logged and swallowed so the
/// service keeps running in degraded mode.
pub async fn migrate(db: &PgPool) {
    match sqlx::migrate!("./migrations").run(db).await {
        Ok(()) => tracing::info!("database schema up to date"),
        Err(e) => {
            tracing::warn!(error = %e, "schema migration failed; continuing in degraded mode")
        }
    }
}

/// Connects to the Postgres named by `DATABASE_URL` and applies the schema.
/// Only used by `#[ignore]`d tests run with `cargo test -- --ignored`.
#[cfg(test)]
pub(crate) async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrate test database");
    pool
}

/// Suffix that keeps rows from separate test runs apart.
#[cfg(test)]
pub(crate) fn unique_suffix() -> String {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos().to_string()
}
