//! Error types shared across seqsleuth crates

use thiserror::Error;

/// Result type alias for value parsing
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while parsing user-supplied values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Unknown file format: '{0}'. Expected one of: fastq, bam, vcf")]
    UnknownFormat(String),

    #[error("Invalid read count: '{0}'. Please provide a number greater than or equal to -1, where -1 indicates all reads")]
    InvalidReadLimit(String),

    #[error("Invalid worker count: '{0}'. Number of workers must be greater than 0, or 'all' to use every CPU core")]
    InvalidWorkers(String),
}
