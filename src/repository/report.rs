//! Diesel-backed report store.
//!
//! Each operation takes its own connection from the pool. Writes and
//! truncation run in a single transaction across all report tables.

use async_trait::async_trait;
use chrono::Local;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{debug, info};

use super::models::{
    CrawlStateRecord, DetailsRecord, LocationRecord, MethodRecord, ReportRows, StatusRecord,
    UpdatesRecord, CRAWL_STATE_ID,
};
use super::pool::DbPool;
use super::store::{ReportStore, StoreError, TableCounts};
use crate::models::Report;
use crate::schema::{crawl_state, details, location, logs, method, status, updates};
use crate::with_conn;

#[derive(Clone)]
pub struct ReportRepository {
    pool: DbPool,
}

impl ReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_state(&self) -> Result<CrawlStateRecord, StoreError> {
        let state: Option<CrawlStateRecord> = with_conn!(self.pool, conn, {
            crawl_state::table
                .find(CRAWL_STATE_ID)
                .first::<CrawlStateRecord>(&mut conn)
                .await
                .optional()
        })?;
        state.ok_or(StoreError::MissingState)
    }

    /// Create the crawl-state row if it does not exist. Returns whether it was created.
    pub async fn ensure_state(&self, initial_bound: i64) -> Result<bool, StoreError> {
        let created = with_conn!(self.pool, conn, {
            let existing: Option<CrawlStateRecord> = crawl_state::table
                .find(CRAWL_STATE_ID)
                .first(&mut conn)
                .await
                .optional()?;

            if existing.is_some() {
                Ok::<_, DieselError>(false)
            } else {
                diesel::insert_into(crawl_state::table)
                    .values(&CrawlStateRecord {
                        id: CRAWL_STATE_ID,
                        upper_number: initial_bound,
                        autofind: 1,
                    })
                    .execute(&mut conn)
                    .await?;
                Ok(true)
            }
        })?;

        if created {
            info!("Initialized crawl state with upper bound {}", initial_bound);
        }
        Ok(created)
    }

    async fn update_state(&self, bound: Option<i64>, autofind: Option<bool>) -> Result<(), StoreError> {
        let mut state = self.load_state().await?;
        if let Some(bound) = bound {
            state.upper_number = bound;
        }
        if let Some(enabled) = autofind {
            state.autofind = i32::from(enabled);
        }

        with_conn!(self.pool, conn, {
            diesel::update(crawl_state::table.find(CRAWL_STATE_ID))
                .set((
                    crawl_state::upper_number.eq(state.upper_number),
                    crawl_state::autofind.eq(state.autofind),
                ))
                .execute(&mut conn)
                .await
        })?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        use diesel::dsl::count_star;
        let count: i64 = with_conn!(self.pool, conn, {
            status::table
                .filter(status::id.eq(id))
                .select(count_star())
                .first(&mut conn)
                .await
        })?;
        Ok(count > 0)
    }

    async fn write(&self, report: &Report) -> Result<(), StoreError> {
        let rows = ReportRows::from_report(report, &Local::now().naive_local());
        let rows = &rows;

        let result: Result<(), DieselError> = with_conn!(self.pool, conn, {
            conn.transaction(|conn| {
                Box::pin(async move {
                    diesel::insert_into(status::table)
                        .values(&rows.status)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(details::table)
                        .values(&rows.details)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(location::table)
                        .values(&rows.location)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(method::table)
                        .values(&rows.method)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(updates::table)
                        .values(&rows.updates)
                        .execute(conn)
                        .await?;
                    diesel::insert_into(logs::table)
                        .values(&rows.log)
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .await
        });

        match result {
            Ok(()) => {
                debug!("Stored report {} ({})", report.id, rows.log.outcome);
                Ok(())
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Duplicate(report.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, id: i64) -> Result<Option<Report>, StoreError> {
        let rows = with_conn!(self.pool, conn, {
            let status_row: Option<StatusRecord> = status::table
                .find(id)
                .first(&mut conn)
                .await
                .optional()?;
            let Some(status_row) = status_row else {
                return Ok(None);
            };

            let details_row: DetailsRecord = details::table.find(id).first(&mut conn).await?;
            let location_row: LocationRecord = location::table.find(id).first(&mut conn).await?;
            let method_row: MethodRecord = method::table.find(id).first(&mut conn).await?;
            let updates_row: UpdatesRecord = updates::table.find(id).first(&mut conn).await?;
            let log_row = logs::table.find(id).first(&mut conn).await?;

            ReportRows {
                status: status_row,
                details: details_row,
                location: location_row,
                method: method_row,
                updates: updates_row,
                log: log_row,
            }
        });

        rows.into_report()
            .map(Some)
            .map_err(StoreError::InvalidRow)
    }

    async fn row_count(&self) -> Result<i64, StoreError> {
        let count = with_conn!(self.pool, conn, {
            status::table.count().get_result::<i64>(&mut conn).await
        })?;
        Ok(count)
    }

    async fn read_bound(&self) -> Result<i64, StoreError> {
        Ok(self.load_state().await?.upper_number)
    }

    async fn write_bound(&self, bound: i64) -> Result<(), StoreError> {
        self.update_state(Some(bound), None).await?;
        info!("Upper bound set to {}", bound);
        Ok(())
    }

    async fn autofind_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.load_state().await?.autofind != 0)
    }

    async fn set_autofind(&self, enabled: bool) -> Result<(), StoreError> {
        self.update_state(None, Some(enabled)).await
    }

    async fn table_counts(&self) -> Result<TableCounts, StoreError> {
        let counts = with_conn!(self.pool, conn, {
            Ok::<_, DieselError>(TableCounts {
                status: status::table.count().get_result(&mut conn).await?,
                details: details::table.count().get_result(&mut conn).await?,
                location: location::table.count().get_result(&mut conn).await?,
                method: method::table.count().get_result(&mut conn).await?,
                updates: updates::table.count().get_result(&mut conn).await?,
                logs: logs::table.count().get_result(&mut conn).await?,
            })
        })?;
        Ok(counts)
    }

    async fn truncate_all(&self) -> Result<(), StoreError> {
        with_conn!(self.pool, conn, {
            conn.transaction(|conn| {
                Box::pin(async move {
                    diesel::delete(status::table).execute(conn).await?;
                    diesel::delete(details::table).execute(conn).await?;
                    diesel::delete(location::table).execute(conn).await?;
                    diesel::delete(method::table).execute(conn).await?;
                    diesel::delete(updates::table).execute(conn).await?;
                    diesel::delete(logs::table).execute(conn).await?;
                    Ok::<_, DieselError>(())
                })
            })
            .await
        })?;
        info!("Truncated all report tables");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReportBuilder, ReportStatus, Unavailable};
    use crate::repository::DbContext;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let ctx = DbContext::new(&db_path);
        ctx.init_schema().await.unwrap();
        ctx.reports().ensure_state(100).await.unwrap();
        (ctx, dir)
    }

    fn sample_report(id: i64) -> Report {
        let at = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        ReportBuilder::new(
            id,
            "Pothole on High Street".to_string(),
            "Camden Council".to_string(),
            51.5421,
            -0.1419,
        )
        .status(ReportStatus::Investigating)
        .editable(true)
        .reported_at(Some(at))
        .category(Some("Potholes".to_string()))
        .description(Some("Big hole.\n\nNear the bus stop.".to_string()))
        .method(Some("mobile".to_string()))
        .updates(2, Some(at))
        .build()
    }

    #[tokio::test]
    async fn test_round_trip_full_report() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.reports();
        let report = sample_report(7);

        assert!(!repo.exists(7).await.unwrap());
        repo.write(&report).await.unwrap();
        assert!(repo.exists(7).await.unwrap());
        assert_eq!(repo.read(7).await.unwrap(), Some(report));
        assert_eq!(repo.read(8).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_round_trip_placeholder() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.reports();
        let placeholder = Report::placeholder(11, Unavailable::Gone);

        repo.write(&placeholder).await.unwrap();
        let stored = repo.read(11).await.unwrap().unwrap();
        assert_eq!(stored, placeholder);
        assert!(stored.reported_at.is_none());
        assert!(stored.latest_update_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_write_is_rejected_atomically() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.reports();
        repo.write(&sample_report(3)).await.unwrap();

        let err = repo.write(&sample_report(3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(3)));
        assert_eq!(repo.table_counts().await.unwrap(), TableCounts::uniform(1));
    }

    #[tokio::test]
    async fn test_integrity_check_detects_missing_row() {
        let (ctx, dir) = setup_test_db().await;
        let repo = ctx.reports();
        for id in 1..=10 {
            repo.write(&Report::placeholder(id, Unavailable::NotFound))
                .await
                .unwrap();
        }
        assert_eq!(
            repo.integrity_check().await.unwrap(),
            TableCounts::uniform(10)
        );

        let raw = rusqlite::Connection::open(dir.path().join("test.db")).unwrap();
        rusqlite::Connection::execute(&raw, "DELETE FROM status WHERE id = 10", []).unwrap();

        match repo.integrity_check().await {
            Err(StoreError::IntegrityMismatch(counts)) => {
                assert_eq!(counts.status, 9);
                assert_eq!(counts.details, 10);
                assert_eq!(counts.location, 10);
            }
            other => panic!("expected integrity mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bound_and_autofind_state() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.reports();

        assert_eq!(repo.read_bound().await.unwrap(), 100);
        assert!(repo.autofind_enabled().await.unwrap());

        repo.write_bound(250).await.unwrap();
        repo.set_autofind(false).await.unwrap();
        assert_eq!(repo.read_bound().await.unwrap(), 250);
        assert!(!repo.autofind_enabled().await.unwrap());

        // Existing state is left alone.
        assert!(!repo.ensure_state(100).await.unwrap());
        assert_eq!(repo.read_bound().await.unwrap(), 250);
    }

    #[tokio::test]
    async fn test_missing_state() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("empty.db"));
        ctx.init_schema().await.unwrap();

        let err = ctx.reports().read_bound().await.unwrap_err();
        assert!(matches!(err, StoreError::MissingState));
    }

    #[tokio::test]
    async fn test_truncate_keeps_state() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.reports();
        repo.write(&sample_report(1)).await.unwrap();
        repo.write(&Report::placeholder(2, Unavailable::Forbidden))
            .await
            .unwrap();
        assert_eq!(repo.row_count().await.unwrap(), 2);

        repo.truncate_all().await.unwrap();
        assert_eq!(repo.row_count().await.unwrap(), 0);
        assert_eq!(repo.table_counts().await.unwrap(), TableCounts::uniform(0));
        assert_eq!(repo.read_bound().await.unwrap(), 100);
    }
}
