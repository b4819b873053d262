//! fms - FixMyStreet report archiver.

use fmsacquire::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // RUST_LOG wins, then LOG_LEVEL, then verbosity
    let default_filter = if cli::is_verbose() {
        "fmsacquire=info".to_string()
    } else {
        "fmsacquire=warn".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .filter(|level| !level.is_empty())
            .map(|level| format!("fmsacquire={}", level.to_lowercase()))
            .unwrap_or(default_filter);
        EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("fmsacquire=warn"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
