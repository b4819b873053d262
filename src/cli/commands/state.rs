//! Crawl state management commands.

use console::style;

use super::helpers::open_store;
use crate::config::Settings;
use crate::repository::ReportStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Show the stored crawl state.
pub async fn cmd_state_show(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings).await?;

    let bound = store.read_bound().await?;
    let autofind = store.autofind_enabled().await?;
    let rows = store.row_count().await?;

    println!("\n{}", style("Crawl State").bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Upper bound:", bound);
    println!(
        "{:<20} {}",
        "Autofind:",
        if autofind {
            style("on").green().to_string()
        } else {
            style("off").dim().to_string()
        }
    );
    println!("{:<20} {}", "Stored reports:", rows);
    if bound > 0 {
        println!(
            "{:<20} {:.2}%",
            "Coverage:",
            rows as f64 * 100.0 / bound as f64
        );
    }

    Ok(())
}

/// Overwrite the stored upper bound.
pub async fn cmd_state_set_bound(settings: &Settings, bound: i64) -> anyhow::Result<()> {
    if bound < 1 {
        anyhow::bail!("Upper bound must be at least 1 (got {})", bound);
    }

    let store = open_store(settings).await?;
    let previous = store.read_bound().await?;
    store.write_bound(bound).await?;

    println!(
        "{} Upper bound set to {} (was {})",
        style("✓").green(),
        bound,
        previous
    );
    Ok(())
}

/// Enable or disable discovery at session start.
pub async fn cmd_state_autofind(settings: &Settings, toggle: Toggle) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let enabled = toggle == Toggle::On;
    store.set_autofind(enabled).await?;

    println!(
        "{} Autofind {}",
        style("✓").green(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
