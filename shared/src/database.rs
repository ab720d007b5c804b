//! Scan storage for SQLite and PostgreSQL
//!
//! The `scans` table is keyed by invitation id. Redemption relies on that key:
//! `insert_if_absent` is a single conditional insert, so two concurrent first
//! scans of the same id can never both insert a row.

use crate::{config::DatabaseConfig, error::AppError, models::ScanRecord, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    PgPool, SqlitePool,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tracing::{info, warn};

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// This call created the row.
    Inserted,
    /// A row for the id already existed (or a concurrent insert won).
    AlreadyPresent,
}

#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Short backend name used in logs and health output.
    fn backend(&self) -> &'static str;

    /// Creates the `scans` table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<()>;

    /// Inserts `(id, scanned_at)` unless a row for `id` exists.
    async fn insert_if_absent(&self, id: i64, scanned_at: DateTime<Utc>) -> Result<InsertOutcome>;

    async fn find(&self, id: i64) -> Result<Option<ScanRecord>>;

    async fn ping(&self) -> Result<()>;
}

/// Maps the raw result of an insert onto an [`InsertOutcome`].
///
/// A unique violation means another writer created the row between our
/// statement being planned and executed; that is the same outcome as a
/// conflict skipped by `ON CONFLICT DO NOTHING`.
pub(crate) fn classify_insert(
    result: std::result::Result<u64, sqlx::Error>,
) -> Result<InsertOutcome> {
    match result {
        Ok(0) => Ok(InsertOutcome::AlreadyPresent),
        Ok(_) => Ok(InsertOutcome::Inserted),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            warn!("Unique violation inserting scan, treating as already redeemed: {}", db_err);
            Ok(InsertOutcome::AlreadyPresent)
        }
        Err(e) => Err(AppError::Database(e)),
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Connects to the store named by `config.url` and makes sure the schema exists.
pub async fn connect_scan_store(config: &DatabaseConfig) -> Result<Arc<dyn ScanStore>> {
    let store: Arc<dyn ScanStore> = if config.url.starts_with("sqlite:") {
        Arc::new(SqliteScanStore::connect(config).await?)
    } else if config.url.starts_with("postgres:") || config.url.starts_with("postgresql:") {
        Arc::new(PgScanStore::connect(config).await?)
    } else {
        return Err(AppError::configuration(format!(
            "Unsupported DATABASE_URL scheme: {}",
            config.url.split(':').next().unwrap_or_default()
        )));
    };

    store.ensure_schema().await?;
    info!("Scan store ready ({} backend)", store.backend());

    Ok(store)
}

#[derive(Debug, Clone)]
pub struct SqliteScanStore {
    pool: SqlitePool,
}

impl SqliteScanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!("Initializing SQLite connection pool");

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::configuration(format!("Invalid SQLite URL: {}", e)))?
            .create_if_missing(true);

        // Each connection to an in-memory database gets its own database, so
        // the pool is pinned to one connection that never expires.
        let pool_options = if is_in_memory_sqlite(&config.url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
                .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| AppError::configuration(format!("Failed to open SQLite database: {}", e)))?;

        info!("SQLite connection pool initialized successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ScanStore for SqliteScanStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY,
                scanned_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_absent(&self, id: i64, scanned_at: DateTime<Utc>) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO scans (id, scanned_at)
            VALUES (?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(scanned_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());

        classify_insert(result)
    }

    async fn find(&self, id: i64) -> Result<Option<ScanRecord>> {
        let record = sqlx::query_as::<_, ScanRecord>(
            "SELECT id, scanned_at FROM scans WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgScanStore {
    pool: PgPool,
}

impl PgScanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            "Initializing PostgreSQL connection pool with {} max connections",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
            .test_before_acquire(true)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::configuration(format!("Failed to connect to database: {}", e)))?;

        info!("PostgreSQL connection pool initialized successfully");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ScanStore for PgScanStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id BIGINT PRIMARY KEY,
                scanned_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_absent(&self, id: i64, scanned_at: DateTime<Utc>) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO scans (id, scanned_at)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(scanned_at)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected());

        classify_insert(result)
    }

    async fn find(&self, id: i64) -> Result<Option<ScanRecord>> {
        let record = sqlx::query_as::<_, ScanRecord>(
            "SELECT id, scanned_at FROM scans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
