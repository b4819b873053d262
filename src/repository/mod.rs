//! Repository layer for report persistence.
//!
//! All database access uses Diesel with diesel-async. SQLite is the default
//! backend; PostgreSQL is available behind the `postgres` feature.

pub mod context;
#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pool;
pub mod report;
pub mod store;
pub mod util;

pub use context::DbContext;
pub use pool::{DbError, DbPool};
pub use report::ReportRepository;
pub use store::{ReportStore, StoreError, TableCounts};
pub use util::redact_url_password;
