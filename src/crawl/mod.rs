//! Crawl-and-ingest pipeline: identifier strategies, boundary discovery and
//! the session orchestrator.

pub mod boundary;
mod error;
pub mod ingestor;
pub mod strategy;
#[cfg(test)]
pub(crate) mod testing;

pub use boundary::{
    discover_bound, BoundaryScan, Discovery, ScanState, DEFAULT_MISS_THRESHOLD,
};
pub use error::CrawlError;
pub use ingestor::{Disposition, IngestOptions, Ingestor, SessionSummary};
pub use strategy::{IdStrategy, StrategyKind};
