//! Diesel row types for the report tables.
//!
//! A [`Report`] is split across six tables, one row per identifier in each.
//! Timestamps are stored as `%Y-%m-%dT%H:%M:%S` text.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{Report, ReportStatus, TIMESTAMP_FORMAT};
use crate::schema;

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::status)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StatusRecord {
    pub id: i64,
    pub report_status: String,
    pub reported_at: Option<String>,
    pub editable: i32,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::details)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DetailsRecord {
    pub id: i64,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::location)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LocationRecord {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub council: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::method)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MethodRecord {
    pub id: i64,
    pub report_method: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::updates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UpdatesRecord {
    pub id: i64,
    pub update_count: i32,
    pub latest_update_at: Option<String>,
}

/// Ingestion log entry: fetch outcome and time of write.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LogRecord {
    pub id: i64,
    pub outcome: String,
    pub ingested_at: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::crawl_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CrawlStateRecord {
    pub id: i32,
    pub upper_number: i64,
    pub autofind: i32,
}

/// Id of the single crawl-state row.
pub const CRAWL_STATE_ID: i32 = 1;

fn format_ts(dt: &NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(id: i64, value: Option<&str>) -> Result<Option<NaiveDateTime>, String> {
    value
        .map(|s| {
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                .map_err(|e| format!("report {id}: bad timestamp '{s}': {e}"))
        })
        .transpose()
}

/// All rows written for one report.
#[derive(Debug, Clone)]
pub struct ReportRows {
    pub status: StatusRecord,
    pub details: DetailsRecord,
    pub location: LocationRecord,
    pub method: MethodRecord,
    pub updates: UpdatesRecord,
    pub log: LogRecord,
}

impl ReportRows {
    pub fn from_report(report: &Report, ingested_at: &NaiveDateTime) -> Self {
        let id = report.id;
        Self {
            status: StatusRecord {
                id,
                report_status: report.status.as_str().to_string(),
                reported_at: report.reported_at.as_ref().map(format_ts),
                editable: i32::from(report.editable),
            },
            details: DetailsRecord {
                id,
                category: report.category.clone(),
                title: report.title.clone(),
                description: report.description.clone(),
            },
            location: LocationRecord {
                id,
                latitude: report.latitude,
                longitude: report.longitude,
                council: report.council.clone(),
            },
            method: MethodRecord {
                id,
                report_method: report.method.clone(),
            },
            updates: UpdatesRecord {
                id,
                update_count: i32::try_from(report.update_count).unwrap_or(i32::MAX),
                latest_update_at: report.latest_update_at.as_ref().map(format_ts),
            },
            log: LogRecord {
                id,
                outcome: report.outcome_label(),
                ingested_at: format_ts(ingested_at),
            },
        }
    }

    /// Reassemble the report. The error names the first unreadable column.
    pub fn into_report(self) -> Result<Report, String> {
        let id = self.status.id;
        let status = ReportStatus::from_str(&self.status.report_status)
            .ok_or_else(|| format!("report {id}: unknown status '{}'", self.status.report_status))?;

        Ok(Report {
            id,
            status,
            editable: self.status.editable != 0,
            reported_at: parse_ts(id, self.status.reported_at.as_deref())?,
            category: self.details.category,
            council: self.location.council,
            title: self.details.title,
            description: self.details.description,
            latitude: self.location.latitude,
            longitude: self.location.longitude,
            method: self.method.report_method,
            update_count: u32::try_from(self.updates.update_count).unwrap_or(0),
            latest_update_at: parse_ts(id, self.updates.latest_update_at.as_deref())?,
        })
    }
}
