//! Command-line interface parsing for the live-score dashboard
//!
//! This module handles parsing of CLI arguments using clap. Flags override
//! the environment configuration and select between the interactive TUI and
//! the one-shot `--once` mode.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// A duration flag was given as zero
    #[error("--{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Live football scores in the terminal, powered by API-Football
#[derive(Parser, Debug)]
#[command(name = "livescore")]
#[command(about = "Live football scores in the terminal, with caching and rate-limit awareness")]
#[command(version)]
pub struct Cli {
    /// API base URL (overrides API_FOOTBALL_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Seconds between automatic refreshes (overrides LIVESCORE_POLL_INTERVAL)
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Request timeout in seconds (overrides LIVESCORE_TIMEOUT)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Directory for the match cache and default log file
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the match cache in memory only
    #[arg(long, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Remove the cached match list before starting
    #[arg(long)]
    pub clear_cache: bool,

    /// Log file used by the interactive UI (default: <cache dir>/livescore.log)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Fetch once, print the matches and exit
    #[arg(long)]
    pub once: bool,

    /// Print JSON instead of text (with --once)
    #[arg(long, requires = "once")]
    pub json: bool,
}

/// How the program runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Full-screen dashboard with auto-refresh
    #[default]
    Interactive,
    /// Single fetch printed to stdout
    Once { json: bool },
}

/// Where the match cache lives
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheLocation {
    /// Platform cache directory
    #[default]
    Default,
    /// Explicit directory
    Dir(PathBuf),
    /// In-memory only
    Memory,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub mode: RunMode,
    pub cache: CacheLocation,
    pub clear_cache: bool,
    pub log_file: Option<PathBuf>,
    pub base_url: Option<String>,
    pub poll_interval: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

/// Converts a seconds flag, rejecting zero
fn seconds_flag(value: Option<u64>, flag: &'static str) -> Result<Option<Duration>, CliError> {
    match value {
        Some(0) => Err(CliError::ZeroDuration(flag)),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if a duration flag is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mode = if cli.once {
            RunMode::Once { json: cli.json }
        } else {
            RunMode::Interactive
        };

        let cache = match (&cli.cache_dir, cli.no_cache) {
            (_, true) => CacheLocation::Memory,
            (Some(dir), false) => CacheLocation::Dir(dir.clone()),
            (None, false) => CacheLocation::Default,
        };

        Ok(StartupConfig {
            mode,
            cache,
            clear_cache: cli.clear_cache,
            log_file: cli.log_file.clone(),
            base_url: cli.base_url.clone(),
            poll_interval: seconds_flag(cli.interval, "interval")?,
            request_timeout: seconds_flag(cli.timeout, "timeout")?,
        })
    }
}
