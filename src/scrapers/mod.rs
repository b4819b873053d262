//! Report page fetching and extraction.

pub mod fetcher;
mod http_client;
pub mod report_page;

pub use fetcher::{FetchError, FetchOutcome, HttpPageFetcher, PageFetcher};
pub use http_client::{HttpClient, USER_AGENT};
pub use report_page::{extract_report, ExtractError};
