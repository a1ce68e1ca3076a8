//! Error types for the seqsleuth CLI
//!
//! Run-terminating errors carry user-facing messages that say what went wrong
//! and how to fix it. Per-file extraction failures never appear here; the
//! invoker absorbs them.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Problems with the manifest. All of them abort the run before any batch starts.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Cannot read manifest '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Manifest is missing the '{0}' column. Expected columns: filetype, filename, filepath")]
    MissingColumn(&'static str),

    #[error("Manifest row on line {line} is missing a value for '{field}'")]
    MalformedRow { line: u64, field: &'static str },
}

/// Failure to create or write one format's output table
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot create output table '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Cannot write to output table '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Cannot flush output table '{path}': {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize metadata for '{locator}': {source}")]
    Serialize {
        locator: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for a seqsleuth run
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your command-line flags and SEQSLEUTH_* environment variables.")]
    Config(String),

    /// The manifest could not be loaded or partitioned
    #[error("Invalid file list: {0}")]
    Manifest(#[from] ManifestError),

    /// The output directory could not be created
    #[error("Cannot create output directory '{path}': {source}. Check permissions and disk space.")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run finished but did not produce every table
    #[error("Run incomplete: {0}")]
    Incomplete(String),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an incomplete-run error
    pub fn incomplete(msg: impl Into<String>) -> Self {
        Self::Incomplete(msg.into())
    }
}

impl From<seqsleuth_common::CommonError> for CliError {
    fn from(err: seqsleuth_common::CommonError) -> Self {
        Self::Config(err.to_string())
    }
}
