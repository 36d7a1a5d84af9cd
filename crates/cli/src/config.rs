//! Command-line and environment configuration.
//!
//! Every option can come from a flag or an environment variable; a `.env`
//! file is loaded into the environment before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use overseerr_client::transport::DEFAULT_REQUEST_TIMEOUT_SECS;
use sync_engine::DEFAULT_WORKERS;

/// overseerr-sync - request every movie of a watchlist feed on Overseerr
#[derive(Parser, Debug)]
#[command(name = "overseerr-sync")]
#[command(version)]
#[command(about = "Sync a movie watchlist RSS feed with Overseerr", long_about = None)]
pub struct Cli {
    /// Base URL of the Overseerr instance
    #[arg(long, env = "OVERSEERR_URL")]
    pub url: Option<String>,

    /// Overseerr API key
    #[arg(long, env = "OVERSEERR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the watchlist feed
    #[arg(short, long, env = "XML_FILE", default_value = "feed.xml")]
    pub feed: PathBuf,

    /// Number of movies processed concurrently
    #[arg(short, long, env = "SYNC_WORKERS", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "OVERSEERR_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Retries for transient server errors
    #[arg(long, env = "OVERSEERR_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variables: create a .env file with OVERSEERR_URL and OVERSEERR_API_KEY")]
    MissingCredentials,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Validated settings for one sync run
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub feed_path: PathBuf,
    pub workers: usize,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let url = cli.url.filter(|v| !v.trim().is_empty());
        let api_key = cli.api_key.filter(|v| !v.trim().is_empty());
        let (Some(base_url), Some(api_key)) = (url, api_key) else {
            return Err(ConfigError::MissingCredentials);
        };

        if cli.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if cli.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            base_url,
            api_key,
            feed_path: cli.feed,
            workers: cli.workers,
            timeout: Duration::from_secs(cli.timeout),
            max_retries: cli.max_retries,
        })
    }
}
