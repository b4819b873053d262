//! Data models for fmsacquire.

mod report;

pub use report::{
    Report, ReportBuilder, ReportField, ReportStatus, Unavailable, NOT_AVAILABLE,
    TIMESTAMP_FORMAT,
};
