//! seqsleuth CLI Library
//!
//! Batch metadata extraction for genomic files listed in a manifest.
//!
//! # Overview
//!
//! - **Manifest**: CSV rows of `filetype`, `filename`, `filepath` ([`manifest`])
//! - **Partitioning**: one batch of tasks per recognized format ([`partition`])
//! - **Extraction**: failure-isolating invoker over the extractor registry ([`invoker`])
//! - **Worker pool**: bounded concurrency on the blocking thread pool ([`pool`])
//! - **Output**: one streaming `<format>_metadata.csv` table per batch ([`sink`])
//! - **Runner**: ties it together and reports a [`runner::RunSummary`]

pub mod config;
pub mod error;
pub mod invoker;
pub mod manifest;
pub mod partition;
pub mod pool;
pub mod progress;
pub mod runner;
pub mod sink;
pub mod task;

// Re-export commonly used types
pub use config::Config;
pub use error::{CliError, ManifestError, Result, SinkError};
pub use runner::{BatchRunner, BatchSummary, RunSummary};
pub use task::{ExtractionResult, TaskDescriptor};

use clap::Parser;
use seqsleuth_common::{ReadLimit, WorkerCount};
use std::path::PathBuf;
use std::time::Duration;

/// Predict the sequencing technology and extract metadata from FASTQ, BAM and VCF files
#[derive(Parser, Debug)]
#[command(name = "seqsleuth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CSV file with the columns `filetype`, `filename` and `filepath`. The
    /// path and name are combined with the base URL into each file's locator.
    pub file_list: PathBuf,

    /// Number of reads to process per FASTQ file; -1 processes all reads [default: 5]
    #[arg(long, visible_alias = "num_reads", allow_negative_numbers = true)]
    pub num_reads: Option<ReadLimit>,

    /// Number of concurrent workers, or 'all' for one per CPU core [default: 1]
    #[arg(short, long)]
    pub workers: Option<WorkerCount>,

    /// Directory for the <format>_metadata.csv tables [default: .]
    #[arg(short, long, visible_alias = "output_dir")]
    pub output_dir: Option<PathBuf>,

    /// Prefix for every file locator (URL or local directory)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Write failed files as rows with an {"error": ...} metadata cell
    #[arg(long)]
    pub failure_rows: bool,

    /// Give up on a single file after this many seconds
    #[arg(long, value_name = "SECS")]
    pub task_timeout: Option<u64>,

    /// Print detailed messages
    #[arg(short, long)]
    pub verbose: bool,

    /// Show a progress bar per format
    #[arg(short, long)]
    pub progress: bool,
}

impl Cli {
    /// Overlay command-line flags on `config`
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(read_limit) = self.num_reads {
            config.read_limit = read_limit;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(secs) = self.task_timeout {
            config.task_timeout = Some(Duration::from_secs(secs));
        }
        config.failure_rows |= self.failure_rows;
        config.progress |= self.progress;

        config.validate()?;
        Ok(config)
    }
}
