//! Upper-bound discovery.
//!
//! Scans identifiers upward from the stored bound. Any page that exists
//! (200, 403 or 410) becomes the tentative highest; a run of consecutive
//! 404s at least `threshold` long confirms it.

use std::time::Duration;

use tracing::{debug, info};

use super::error::CrawlError;
use crate::repository::ReportStore;
use crate::scrapers::{FetchOutcome, PageFetcher};

/// Consecutive misses that confirm the ceiling.
pub const DEFAULT_MISS_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning { current: i64, misses: u32 },
    Confirmed(i64),
}

/// Pure discovery state machine, fed one fetch result at a time.
#[derive(Debug, Clone)]
pub struct BoundaryScan {
    start: i64,
    threshold: u32,
    current: i64,
    misses: u32,
    highest: Option<i64>,
}

impl BoundaryScan {
    pub fn new(start: i64, threshold: u32) -> Self {
        Self {
            start,
            threshold: threshold.max(1),
            current: start,
            misses: 0,
            highest: None,
        }
    }

    /// Identifier to fetch next.
    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn highest(&self) -> Option<i64> {
        self.highest
    }

    /// Record whether the current identifier exists and advance.
    pub fn observe(&mut self, hit: bool) -> ScanState {
        if hit {
            self.highest = Some(self.current);
            self.misses = 0;
        } else {
            self.misses += 1;
        }

        if self.misses >= self.threshold {
            return ScanState::Confirmed(self.highest.unwrap_or(self.start));
        }

        self.current += 1;
        ScanState::Scanning {
            current: self.current,
            misses: self.misses,
        }
    }
}

/// Result of a discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discovery {
    pub previous: i64,
    pub confirmed: i64,
    pub requests: u32,
}

impl Discovery {
    pub fn advanced(&self) -> bool {
        self.confirmed > self.previous
    }
}

/// Scan past the stored bound and persist the confirmed ceiling.
///
/// Pages fetched here are not stored. `pacing` is slept after every request.
pub async fn discover_bound<F, S>(
    fetcher: &F,
    store: &S,
    threshold: u32,
    pacing: Duration,
) -> Result<Discovery, CrawlError>
where
    F: PageFetcher + ?Sized,
    S: ReportStore + ?Sized,
{
    let previous = store.read_bound().await?;
    info!("Discovering upper bound from {}", previous);

    let mut scan = BoundaryScan::new(previous, threshold);
    let mut requests = 0u32;

    let confirmed = loop {
        let id = scan.current();
        let outcome = fetcher.fetch(id).await?;
        requests += 1;

        let hit = match outcome {
            FetchOutcome::Success(_) | FetchOutcome::Forbidden | FetchOutcome::Gone => true,
            FetchOutcome::NotFound => false,
            FetchOutcome::Unexpected(status) => {
                return Err(CrawlError::UnexpectedStatus { id, status });
            }
        };

        let state = scan.observe(hit);
        debug!("Checked {} hit={} -> {:?}", id, hit, state);
        tokio::time::sleep(pacing).await;

        if let ScanState::Confirmed(bound) = state {
            break bound;
        }
    };

    store.write_bound(confirmed).await?;
    info!(
        "Upper bound confirmed at {} (was {}, {} requests)",
        confirmed, previous, requests
    );

    Ok(Discovery {
        previous,
        confirmed,
        requests,
    })
}
