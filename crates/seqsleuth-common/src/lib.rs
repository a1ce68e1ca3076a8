//! seqsleuth Common Library
//!
//! Shared types, logging, and error handling for the seqsleuth workspace.
//!
//! # Overview
//!
//! - **Types**: the closed set of genomic file formats, read-count limits,
//!   worker counts, and the metadata mapping every extractor produces
//! - **Logging**: centralized `tracing` subscriber setup
//! - **Error Handling**: value-parsing errors shared by the CLI and extractors
//!
//! # Example
//!
//! ```
//! use seqsleuth_common::{FileFormat, ReadLimit};
//!
//! let format: FileFormat = "FASTQ".parse().unwrap();
//! assert_eq!(format.table_name(), "fastq_metadata.csv");
//!
//! let limit: ReadLimit = "-1".parse().unwrap();
//! assert!(limit.is_unbounded());
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
pub use types::{FileFormat, Metadata, ReadLimit, WorkerCount};
