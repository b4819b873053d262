//! In-memory report store for pipeline tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::store::{ReportStore, StoreError, TableCounts};
use crate::models::Report;

#[derive(Default)]
struct Inner {
    reports: BTreeMap<i64, Report>,
    bound: Option<i64>,
    autofind: bool,
    writes: Vec<i64>,
    forced_counts: Option<TableCounts>,
}

/// Store backed by a map; bound and flag behave like the crawl-state row.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn with_bound(bound: i64, autofind: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bound: Some(bound),
                autofind,
                ..Inner::default()
            }),
        }
    }

    /// Pre-populate identifiers as placeholders without recording writes.
    pub async fn seed(&self, ids: impl IntoIterator<Item = i64>) {
        let mut inner = self.inner.lock().await;
        for id in ids {
            inner.reports.insert(
                id,
                Report::placeholder(id, crate::models::Unavailable::NotFound),
            );
        }
    }

    /// Make `table_counts` report these counts instead of the real ones.
    pub async fn force_counts(&self, counts: TableCounts) {
        self.inner.lock().await.forced_counts = Some(counts);
    }

    /// Identifiers written through `write`, in order.
    pub async fn writes(&self) -> Vec<i64> {
        self.inner.lock().await.writes.clone()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.reports.contains_key(&id))
    }

    async fn write(&self, report: &Report) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.reports.contains_key(&report.id) {
            return Err(StoreError::Duplicate(report.id));
        }
        inner.reports.insert(report.id, report.clone());
        inner.writes.push(report.id);
        Ok(())
    }

    async fn read(&self, id: i64) -> Result<Option<Report>, StoreError> {
        Ok(self.inner.lock().await.reports.get(&id).cloned())
    }

    async fn row_count(&self) -> Result<i64, StoreError> {
        Ok(self.inner.lock().await.reports.len() as i64)
    }

    async fn read_bound(&self) -> Result<i64, StoreError> {
        self.inner.lock().await.bound.ok_or(StoreError::MissingState)
    }

    async fn write_bound(&self, bound: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.bound.is_none() {
            return Err(StoreError::MissingState);
        }
        inner.bound = Some(bound);
        Ok(())
    }

    async fn autofind_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.autofind)
    }

    async fn set_autofind(&self, enabled: bool) -> Result<(), StoreError> {
        self.inner.lock().await.autofind = enabled;
        Ok(())
    }

    async fn table_counts(&self) -> Result<TableCounts, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .forced_counts
            .unwrap_or_else(|| TableCounts::uniform(inner.reports.len() as i64)))
    }

    async fn truncate_all(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.reports.clear();
        inner.forced_counts = None;
        Ok(())
    }
}
