use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use overseerr_client::{HttpTransport, OverseerrClient, RetryPolicy};
use sync_engine::{SyncOrchestrator, SyncReport};

mod config;

use config::{Cli, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; the variables may come from the environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(cli).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!("Reading feed {}", config.feed_path.display());
    let start = Instant::now();
    let entries = feed::load_watchlist(&config.feed_path)
        .with_context(|| format!("Failed to load feed {}", config.feed_path.display()))?;
    info!("Found {} movies in feed", entries.len());

    let transport = HttpTransport::builder(&config.base_url, &config.api_key)
        .timeout(config.timeout)
        .retry_policy(RetryPolicy {
            max_retries: config.max_retries,
            ..RetryPolicy::default()
        })
        .build()
        .context("Failed to build the Overseerr HTTP client")?;
    let client = OverseerrClient::new(Arc::new(transport));

    let orchestrator = SyncOrchestrator::new(Arc::new(client)).with_workers(config.workers);
    let report = orchestrator.run(entries).await;

    print_summary(&report);
    println!("{} Done in {:?}", "✓".green(), start.elapsed());

    Ok(())
}

/// Print the per-run counts and any entry that failed
fn print_summary(report: &SyncReport) {
    println!("{}", "Sync summary:".bold().blue());
    println!("{}Movies in feed: {}", "• ".cyan(), report.total());
    println!("{}Requested: {}", "• ".green(), report.requested());
    println!("{}Not found: {}", "• ".yellow(), report.not_found());
    println!("{}Failed: {}", "• ".red(), report.failed());

    for outcome in report.outcomes.iter().filter(|o| o.is_failure()) {
        println!(
            "  - {} ({}): {}",
            outcome.entry.title(),
            outcome.entry.year(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}
