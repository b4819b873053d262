//! Database management commands.

use console::style;

use super::helpers::{open_store, print_table_counts};
use crate::config::Settings;
use crate::repository::{redact_url_password, ReportStore, StoreError};

/// Verify the report tables agree on row count.
pub async fn cmd_db_check(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings).await?;

    match store.integrity_check().await {
        Ok(counts) => {
            println!(
                "{} Integrity check passed: {} rows in every table",
                style("✓").green(),
                counts.status
            );
            Ok(())
        }
        Err(StoreError::IntegrityMismatch(counts)) => {
            println!("{} Report tables disagree:", style("✗").red());
            print_table_counts(&counts);
            Err(StoreError::IntegrityMismatch(counts).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show connection details, crawl state and table sizes.
pub async fn cmd_db_status(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings).await?;

    let counts = store.table_counts().await?;
    let bound = store.read_bound().await?;
    let autofind = store.autofind_enabled().await?;

    println!("\n{}", style("Database Status").bold());
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {}",
        "Database:",
        redact_url_password(&settings.database_url())
    );
    println!(
        "{:<20} {}",
        "Backend:",
        if settings.is_postgres() {
            "PostgreSQL"
        } else {
            "SQLite"
        }
    );
    println!("{:<20} {}", "Upper bound:", bound);
    println!(
        "{:<20} {}",
        "Autofind:",
        if autofind { "on" } else { "off" }
    );
    println!("\n{}", style("Rows per table").bold());
    print_table_counts(&counts);

    if !counts.is_consistent() {
        println!(
            "\n{} Tables are out of step. Run 'fms db truncate' to reset.",
            style("!").yellow()
        );
    }

    Ok(())
}

/// Delete every stored report, keeping the crawl state.
pub async fn cmd_db_truncate(settings: &Settings, yes: bool) -> anyhow::Result<()> {
    if !yes {
        println!(
            "{} This will delete ALL stored reports from {}.",
            style("!").yellow(),
            redact_url_password(&settings.database_url())
        );
        println!("  The upper bound and autofind flag are kept.");
        println!("  Use --yes to proceed.");
        return Ok(());
    }

    let store = open_store(settings).await?;
    let before = store.row_count().await?;
    store.truncate_all().await?;

    println!(
        "{} Deleted {} stored reports",
        style("✓").green(),
        before
    );
    Ok(())
}
