//! Crawl session orchestration.
//!
//! A session optionally truncates the store, checks table integrity, runs
//! boundary discovery when the stored autofind flag allows it, and then
//! walks the chosen identifier strategy:
//!
//! | fetch outcome          | action                          |
//! |------------------------|---------------------------------|
//! | 200                    | extract and store the report    |
//! | 404 / 403 / 410        | store a placeholder             |
//! | anything else          | stop with an error              |
//!
//! Identifiers already in the store are skipped by the strategy before any
//! request is made.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use super::boundary::{discover_bound, Discovery, DEFAULT_MISS_THRESHOLD};
use super::error::CrawlError;
use super::strategy::{IdStrategy, StrategyKind};
use crate::models::{Report, Unavailable};
use crate::repository::ReportStore;
use crate::scrapers::{extract_report, FetchOutcome, PageFetcher};

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Sleep after every fetched candidate and discovery request.
    pub pacing: Duration,
    /// Delete all report rows before starting.
    pub truncate: bool,
    /// Grace period between the truncate warning and the delete.
    pub truncate_delay: Duration,
    /// Allow discovery (it still requires the stored autofind flag).
    pub discover: bool,
    pub miss_threshold: u32,
    /// Stop after this many fetched candidates.
    pub limit: Option<u64>,
    /// Date used to resolve weekday-only timestamps. Defaults to today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_secs(1),
            truncate: false,
            truncate_delay: Duration::from_secs(3),
            discover: true,
            miss_threshold: DEFAULT_MISS_THRESHOLD,
            limit: None,
            reference_date: None,
        }
    }
}

/// What happened to one fetched identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ingested,
    Placeholder(Unavailable),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub ingested: u64,
    pub placeholders: u64,
    pub skipped: u64,
    pub bound: i64,
    #[serde(skip)]
    pub discovery: Option<Discovery>,
}

impl SessionSummary {
    pub fn fetched(&self) -> u64 {
        self.ingested + self.placeholders
    }
}

/// Runs crawl sessions against a fetcher and a store.
pub struct Ingestor<F, S> {
    fetcher: F,
    store: S,
    options: IngestOptions,
}

impl<F, S> Ingestor<F, S>
where
    F: PageFetcher,
    S: ReportStore,
{
    pub fn new(fetcher: F, store: S, options: IngestOptions) -> Self {
        Self {
            fetcher,
            store,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run one session with the given strategy.
    pub async fn run(&self, kind: StrategyKind) -> Result<SessionSummary, CrawlError> {
        let mut summary = SessionSummary::default();

        if self.options.truncate {
            warn!(
                "Truncating all report tables in {} seconds",
                self.options.truncate_delay.as_secs()
            );
            tokio::time::sleep(self.options.truncate_delay).await;
            self.store.truncate_all().await?;
        }

        let counts = self.store.integrity_check().await?;
        info!("Integrity check passed ({} rows per table)", counts.status);

        if self.options.discover && self.store.autofind_enabled().await? {
            summary.discovery = Some(
                discover_bound(
                    &self.fetcher,
                    &self.store,
                    self.options.miss_threshold,
                    self.options.pacing,
                )
                .await?,
            );
        }

        let bound = self.store.read_bound().await?;
        summary.bound = bound;
        info!("Starting {} crawl up to {}", kind.as_str(), bound);

        let mut strategy = IdStrategy::for_kind(kind, bound);
        loop {
            if let Some(limit) = self.options.limit {
                if summary.fetched() >= limit {
                    info!("Reached limit of {} fetched reports", limit);
                    break;
                }
            }

            let skipped_before = strategy.skipped();
            let next = strategy.next(&self.store).await?;

            // Skipped identifiers are paced like fetched ones.
            let newly_skipped = strategy.skipped() - skipped_before;
            if newly_skipped > 0 {
                let times = u32::try_from(newly_skipped).unwrap_or(u32::MAX);
                tokio::time::sleep(self.options.pacing.saturating_mul(times)).await;
            }

            let Some(id) = next else {
                break;
            };

            match self.ingest(id).await? {
                Disposition::Ingested => summary.ingested += 1,
                Disposition::Placeholder(_) => summary.placeholders += 1,
            }
            tokio::time::sleep(self.options.pacing).await;
        }

        summary.skipped = strategy.skipped();
        info!(
            "Session finished: {} ingested, {} placeholders, {} skipped",
            summary.ingested, summary.placeholders, summary.skipped
        );
        Ok(summary)
    }

    /// Fetch, classify and store a single identifier.
    pub async fn ingest(&self, id: i64) -> Result<Disposition, CrawlError> {
        let unavailable = match self.fetcher.fetch(id).await? {
            FetchOutcome::Success(body) => {
                let today = self
                    .options
                    .reference_date
                    .unwrap_or_else(|| Local::now().date_naive());
                let report = extract_report(id, &body, today)
                    .map_err(|source| CrawlError::Extract { id, source })?;
                self.store.write(&report).await?;
                info!("Stored report {}: {}", id, report.title);
                return Ok(Disposition::Ingested);
            }
            FetchOutcome::NotFound => Unavailable::NotFound,
            FetchOutcome::Forbidden => Unavailable::Forbidden,
            FetchOutcome::Gone => Unavailable::Gone,
            FetchOutcome::Unexpected(status) => {
                return Err(CrawlError::UnexpectedStatus { id, status });
            }
        };

        self.store
            .write(&Report::placeholder(id, unavailable))
            .await?;
        info!(
            "Stored placeholder for report {} (HTTP {})",
            id,
            unavailable.status_code()
        );
        Ok(Disposition::Placeholder(unavailable))
    }
}
