//! Database context for managing connections and repository access.
//!
//! The DbContext is the entry point for database operations: it holds the
//! pool, creates the schema and hands out repositories.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::pool::{DbError, DbPool, SqliteConn};
use super::report::ReportRepository;
use crate::with_conn_split;

#[cfg(feature = "postgres")]
use diesel_async::AsyncPgConnection;

/// Holds the connection pool and provides repository access.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:fmsacquire.db")?;
/// ctx.init_schema().await?;
/// let bound = ctx.reports().read_bound().await?;
/// ```
#[derive(Clone)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a context from a database file path (SQLite only).
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: DbPool::sqlite_from_path(db_path),
        }
    }

    /// Create a context from a database URL.
    ///
    /// Supports:
    /// - SQLite: file paths or `sqlite:` URLs
    /// - PostgreSQL: `postgres://` or `postgresql://` URLs
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        Ok(Self {
            pool: DbPool::from_url(url)?,
        })
    }

    /// Get the report repository.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Create the report and crawl-state tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        with_conn_split!(self.pool,
            sqlite: conn => {
                Self::init_sqlite_schema(&mut conn).await
            },
            postgres: conn => {
                Self::init_postgres_schema(&mut conn).await
            }
        )
    }

    async fn init_sqlite_schema(conn: &mut SqliteConn) -> Result<(), DbError> {
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS status (
                id BIGINT PRIMARY KEY,
                status TEXT NOT NULL,
                reported_at TEXT,
                editable INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS details (
                id BIGINT PRIMARY KEY,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT
            );

            CREATE TABLE IF NOT EXISTS location (
                id BIGINT PRIMARY KEY,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                council TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS method (
                id BIGINT PRIMARY KEY,
                method TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS updates (
                id BIGINT PRIMARY KEY,
                update_count INTEGER NOT NULL DEFAULT 0,
                latest_update_at TEXT
            );

            CREATE TABLE IF NOT EXISTS logs (
                id BIGINT PRIMARY KEY,
                outcome TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS crawl_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                upper_number BIGINT NOT NULL,
                autofind INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_status_status ON status(status);
            CREATE INDEX IF NOT EXISTS idx_logs_outcome ON logs(outcome);
            "#,
        )
        .await
    }

    #[cfg(feature = "postgres")]
    async fn init_postgres_schema(conn: &mut AsyncPgConnection) -> Result<(), DbError> {
        use diesel_async::RunQueryDsl;

        // PostgreSQL requires separate statements
        let statements = [
            r#"CREATE TABLE IF NOT EXISTS status (
                id BIGINT PRIMARY KEY,
                status TEXT NOT NULL,
                reported_at TEXT,
                editable INTEGER NOT NULL DEFAULT 0
            )"#,
            r#"CREATE TABLE IF NOT EXISTS details (
                id BIGINT PRIMARY KEY,
                category TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT
            )"#,
            r#"CREATE TABLE IF NOT EXISTS location (
                id BIGINT PRIMARY KEY,
                latitude DOUBLE PRECISION NOT NULL,
                longitude DOUBLE PRECISION NOT NULL,
                council TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS method (
                id BIGINT PRIMARY KEY,
                method TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS updates (
                id BIGINT PRIMARY KEY,
                update_count INTEGER NOT NULL DEFAULT 0,
                latest_update_at TEXT
            )"#,
            r#"CREATE TABLE IF NOT EXISTS logs (
                id BIGINT PRIMARY KEY,
                outcome TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS crawl_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                upper_number BIGINT NOT NULL,
                autofind INTEGER NOT NULL DEFAULT 1
            )"#,
            "CREATE INDEX IF NOT EXISTS idx_status_status ON status(status)",
            "CREATE INDEX IF NOT EXISTS idx_logs_outcome ON logs(outcome)",
        ];

        for stmt in statements {
            diesel::sql_query(stmt).execute(conn).await?;
        }
        Ok(())
    }
}
