//! fmsacquire - incremental archiver for FixMyStreet report pages.
//!
//! Visits `/report/<id>` pages in a chosen order, classifies each response,
//! extracts a normalized record from live pages and stores it in a
//! relational database. Pages that no longer exist are recorded as
//! placeholders so they are never fetched twice.

pub mod cli;
pub mod config;
pub mod crawl;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
