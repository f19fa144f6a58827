use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use threatbrief_core::{AppConfig, Pipeline, RunOutcome};

/// Configuration comes from the environment (or .env / threatbrief.toml);
/// there are no flags beyond --help and --version.
#[derive(Parser)]
#[command(name = "threatbrief")]
#[command(author, version, about = "Poll security feeds and email a prioritized AI intelligence digest")]
struct Cli {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    let config = AppConfig::load();

    // Initialize logging
    let default_level = config
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or(default_level),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = config.inspect_err(|e| tracing::error!("Invalid configuration: {}", e))?;

    let pipeline = Pipeline::from_config(&config)?;

    match pipeline.run().await? {
        RunOutcome::NoNewItems => tracing::info!("Run finished: nothing new to report"),
        RunOutcome::NoReport { pending } => {
            tracing::warn!("Run finished without a report; {} items will be retried", pending)
        }
        RunOutcome::DeliveryFailed { pending } => {
            tracing::warn!("Run finished without delivery; {} items will be retried", pending)
        }
        RunOutcome::Delivered { reported } => {
            tracing::info!("Run finished: report delivered with {} items", reported)
        }
    }

    Ok(())
}
