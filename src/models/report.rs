//! Report records extracted from archive pages.
//!
//! A [`Report`] is the unit of persistence. Records built from a fetched
//! page carry one of the four banner statuses; records written for pages
//! that could not be fetched carry an [`Unavailable`] status and sentinel
//! values in every other column.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Sentinel used for text fields the page did not provide.
pub const NOT_AVAILABLE: &str = "N/a";

/// Storage format for report timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Terminal non-200 fetch result that still gets a row in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    NotFound,
    Forbidden,
    Gone,
}

impl Unavailable {
    /// HTTP status code this marker was derived from.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::Gone => 410,
        }
    }

    /// Canonical reason phrase.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::Forbidden => "Forbidden",
            Self::Gone => "Gone",
        }
    }

    /// Sentinel written to the status and category columns.
    pub fn sentinel(&self) -> &'static str {
        match self {
            Self::NotFound => "N/a - 404",
            Self::Forbidden => "N/a - 403",
            Self::Gone => "N/a - 410",
        }
    }

    /// Sentinel written to the title and description columns.
    pub fn title(&self) -> String {
        format!(
            "N/a - HTTP {}, {}",
            self.status_code(),
            self.reason()
        )
    }

    pub fn from_status_code(code: u16) -> Option<Self> {
        match code {
            404 => Some(Self::NotFound),
            403 => Some(Self::Forbidden),
            410 => Some(Self::Gone),
            _ => None,
        }
    }
}

/// Status of a report as shown by its page banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Unknown,
    Fixed,
    Closed,
    Investigating,
    /// Placeholder status for identifiers without content.
    Unavailable(Unavailable),
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Fixed => "Fixed",
            Self::Closed => "Closed",
            Self::Investigating => "Investigating",
            Self::Unavailable(u) => u.sentinel(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unknown" => Some(Self::Unknown),
            "Fixed" => Some(Self::Fixed),
            "Closed" => Some(Self::Closed),
            "Investigating" => Some(Self::Investigating),
            "N/a - 404" => Some(Self::Unavailable(Unavailable::NotFound)),
            "N/a - 403" => Some(Self::Unavailable(Unavailable::Forbidden)),
            "N/a - 410" => Some(Self::Unavailable(Unavailable::Gone)),
            _ => None,
        }
    }

    /// Map a banner modifier class (`banner--fixed`, ...) to a status.
    pub fn from_banner_class(class: &str) -> Option<Self> {
        match class {
            "banner--unknown" => Some(Self::Unknown),
            "banner--fixed" => Some(Self::Fixed),
            "banner--closed" => Some(Self::Closed),
            "banner--progress" => Some(Self::Investigating),
            _ => None,
        }
    }
}

/// A normalized report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Archive identifier.
    pub id: i64,
    pub status: ReportStatus,
    /// Whether the page offers an update form.
    pub editable: bool,
    pub reported_at: Option<NaiveDateTime>,
    pub category: String,
    /// Destination authority, a council reference, or a not-reported sentinel.
    pub council: String,
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Submission channel (e.g. "mobile").
    pub method: String,
    pub update_count: u32,
    pub latest_update_at: Option<NaiveDateTime>,
}

impl Report {
    /// Build the sentinel-filled record stored for an identifier whose
    /// page could not be fetched.
    pub fn placeholder(id: i64, outcome: Unavailable) -> Self {
        let title = outcome.title();
        Self {
            id,
            status: ReportStatus::Unavailable(outcome),
            editable: false,
            reported_at: None,
            category: outcome.sentinel().to_string(),
            council: NOT_AVAILABLE.to_string(),
            description: Some(title.clone()),
            title,
            latitude: 0.0,
            longitude: 0.0,
            method: NOT_AVAILABLE.to_string(),
            update_count: 0,
            latest_update_at: None,
        }
    }

    /// Outcome label recorded in the ingestion log.
    pub fn outcome_label(&self) -> String {
        match self.status {
            ReportStatus::Unavailable(u) => u.status_code().to_string(),
            _ => "ok".to_string(),
        }
    }
}

/// Field of a report, used to name extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Status,
    Timestamp,
    Council,
    Title,
    Coordinates,
    Updates,
}

impl ReportField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Timestamp => "timestamp",
            Self::Council => "council",
            Self::Title => "title",
            Self::Coordinates => "coordinates",
            Self::Updates => "updates",
        }
    }
}

impl std::fmt::Display for ReportField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assembles a [`Report`] from extracted fields.
///
/// The required fields are taken up front, so a builder always produces a
/// complete record. Optional fields left unset fall back to their sentinels.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    id: i64,
    status: ReportStatus,
    editable: bool,
    reported_at: Option<NaiveDateTime>,
    category: Option<String>,
    council: String,
    title: String,
    description: Option<String>,
    latitude: f64,
    longitude: f64,
    method: Option<String>,
    update_count: u32,
    latest_update_at: Option<NaiveDateTime>,
}

impl ReportBuilder {
    pub fn new(id: i64, title: String, council: String, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            status: ReportStatus::Unknown,
            editable: false,
            reported_at: None,
            category: None,
            council,
            title,
            description: None,
            latitude,
            longitude,
            method: None,
            update_count: 0,
            latest_update_at: None,
        }
    }

    pub fn status(mut self, status: ReportStatus) -> Self {
        self.status = status;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn reported_at(mut self, at: Option<NaiveDateTime>) -> Self {
        self.reported_at = at;
        self
    }

    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn method(mut self, method: Option<String>) -> Self {
        self.method = method;
        self
    }

    pub fn updates(mut self, count: u32, latest: Option<NaiveDateTime>) -> Self {
        self.update_count = count;
        self.latest_update_at = if count > 0 { latest } else { None };
        self
    }

    pub fn build(self) -> Report {
        Report {
            id: self.id,
            status: self.status,
            editable: self.editable,
            reported_at: self.reported_at,
            category: self
                .category
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            council: self.council,
            title: self.title,
            description: self.description,
            latitude: self.latitude,
            longitude: self.longitude,
            method: self.method.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            update_count: self.update_count,
            latest_update_at: self.latest_update_at,
        }
    }
}
