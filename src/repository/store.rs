//! Storage abstraction used by the crawl pipeline.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::Report;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("report {0} is already stored")]
    Duplicate(i64),

    #[error("table row counts differ: {0}")]
    IntegrityMismatch(TableCounts),

    #[error("crawl state has not been initialized (run `fms init`)")]
    MissingState,

    #[error("stored row is unreadable: {0}")]
    InvalidRow(String),
}

/// Row count of each per-report table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub status: i64,
    pub details: i64,
    pub location: i64,
    pub method: i64,
    pub updates: i64,
    pub logs: i64,
}

impl TableCounts {
    /// Every table with the same count.
    pub fn uniform(count: i64) -> Self {
        Self {
            status: count,
            details: count,
            location: count,
            method: count,
            updates: count,
            logs: count,
        }
    }

    pub fn entries(&self) -> [(&'static str, i64); 6] {
        [
            ("details", self.details),
            ("location", self.location),
            ("logs", self.logs),
            ("method", self.method),
            ("status", self.status),
            ("updates", self.updates),
        ]
    }

    pub fn is_consistent(&self) -> bool {
        let entries = self.entries();
        entries.iter().all(|(_, count)| *count == entries[0].1)
    }
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .iter()
            .map(|(table, count)| format!("{table}={count}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Persistent report store and crawl boundary.
///
/// Every operation is independent; implementations hold no cached state.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Whether any record exists for `id`.
    async fn exists(&self, id: i64) -> Result<bool, StoreError>;

    /// Persist every table row for `report` atomically.
    async fn write(&self, report: &Report) -> Result<(), StoreError>;

    async fn read(&self, id: i64) -> Result<Option<Report>, StoreError>;

    /// Number of stored identifiers.
    async fn row_count(&self) -> Result<i64, StoreError>;

    async fn read_bound(&self) -> Result<i64, StoreError>;

    async fn write_bound(&self, bound: i64) -> Result<(), StoreError>;

    async fn autofind_enabled(&self) -> Result<bool, StoreError>;

    async fn set_autofind(&self, enabled: bool) -> Result<(), StoreError>;

    async fn table_counts(&self) -> Result<TableCounts, StoreError>;

    /// Fail with [`StoreError::IntegrityMismatch`] unless all tables agree.
    async fn integrity_check(&self) -> Result<TableCounts, StoreError> {
        let counts = self.table_counts().await?;
        if counts.is_consistent() {
            Ok(counts)
        } else {
            Err(StoreError::IntegrityMismatch(counts))
        }
    }

    /// Remove every report row. The crawl state is kept.
    async fn truncate_all(&self) -> Result<(), StoreError>;
}
