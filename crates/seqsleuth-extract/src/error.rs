//! Error types for metadata extraction

use seqsleuth_common::FileFormat;
use thiserror::Error;

/// Result type alias for extraction
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Failure while extracting metadata from one file.
///
/// These never abort a batch; the invoker logs them and moves on.
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Failed to open '{locator}': {source}")]
    Open {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request for '{locator}' failed: {source}")]
    Http {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unsupported resource locator: '{0}'")]
    UnsupportedLocator(String),

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed {format} record {record}: {message}")]
    Malformed {
        format: FileFormat,
        record: u64,
        message: String,
    },

    #[error("Invalid {format} header: {message}")]
    InvalidHeader { format: FileFormat, message: String },

    #[error("No records found in '{0}'")]
    Empty(String),

    #[error("Extraction cancelled")]
    Cancelled,
}

impl ExtractorError {
    pub fn malformed(format: FileFormat, record: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            record,
            message: message.into(),
        }
    }

    pub fn invalid_header(format: FileFormat, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            format,
            message: message.into(),
        }
    }
}
