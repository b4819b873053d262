//! Crawl session error types.

use thiserror::Error;

use crate::repository::StoreError;
use crate::scrapers::{ExtractError, FetchError};

/// Conditions that end a crawl session.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Report {id}: {source}")]
    Extract {
        id: i64,
        #[source]
        source: ExtractError,
    },
    #[error("Report {id} returned unexpected HTTP status {status}")]
    UnexpectedStatus { id: i64, status: u16 },
}
