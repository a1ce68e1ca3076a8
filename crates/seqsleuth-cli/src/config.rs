//! Configuration management
//!
//! Defaults, overlaid by `SEQSLEUTH_*` environment variables (a `.env` file in
//! the working directory is honored), overlaid by command-line flags.

use crate::error::{CliError, Result};
use seqsleuth_common::{ReadLimit, WorkerCount};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Run Configuration Constants
// ============================================================================

/// Mirror that manifest paths are resolved against.
pub const DEFAULT_BASE_URL: &str = "https://ftp-trace.ncbi.nlm.nih.gov/ReferenceSamples/giab/";

/// Default output directory for the per-format tables.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Default timeout for a single remote request, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

pub const ENV_BASE_URL: &str = "SEQSLEUTH_BASE_URL";
pub const ENV_WORKERS: &str = "SEQSLEUTH_WORKERS";
pub const ENV_NUM_READS: &str = "SEQSLEUTH_NUM_READS";
pub const ENV_OUTPUT_DIR: &str = "SEQSLEUTH_OUTPUT_DIR";
pub const ENV_TASK_TIMEOUT_SECS: &str = "SEQSLEUTH_TASK_TIMEOUT_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "SEQSLEUTH_HTTP_TIMEOUT_SECS";

/// Run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prefix every resource locator starts with
    pub base_url: String,
    /// Concurrency limit for each batch
    pub workers: WorkerCount,
    /// Reads sampled from each FASTQ file
    pub read_limit: ReadLimit,
    pub output_dir: PathBuf,
    /// Deadline for a single extraction task; none by default
    pub task_timeout: Option<Duration>,
    pub http_timeout: Duration,
    /// Write failed tasks as `{"error": ...}` rows instead of omitting them
    pub failure_rows: bool,
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            workers: WorkerCount::default(),
            read_limit: ReadLimit::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            task_timeout: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            failure_rows: false,
            progress: false,
        }
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(workers) = parse_var::<WorkerCount, _>(&lookup, ENV_WORKERS)? {
            config.workers = workers;
        }
        if let Some(read_limit) = parse_var::<ReadLimit, _>(&lookup, ENV_NUM_READS)? {
            config.read_limit = read_limit;
        }
        if let Some(output_dir) = lookup(ENV_OUTPUT_DIR) {
            config.output_dir = PathBuf::from(output_dir);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_TASK_TIMEOUT_SECS)? {
            config.task_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_HTTP_TIMEOUT_SECS)? {
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(CliError::config("Base URL cannot be empty"));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(CliError::config("Output directory cannot be empty"));
        }

        if self.task_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CliError::config("Task timeout must be greater than 0 seconds"));
        }

        if self.http_timeout.is_zero() {
            return Err(CliError::config("HTTP timeout must be greater than 0 seconds"));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CliError::config(format!("{}: {}", key, e))),
    }
}
