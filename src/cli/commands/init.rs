//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::{redact_url_password, ReportStore};

use super::helpers::open_store;

/// Initialize the data directory, database schema and crawl state.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let bound = store.read_bound().await?;

    println!(
        "{} Initialized fmsacquire at {}",
        style("✓").green(),
        redact_url_password(&settings.database_url())
    );
    println!("  Upper bound: {}", bound);

    Ok(())
}
