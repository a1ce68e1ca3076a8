//! seqsleuth Extract Library
//!
//! Metadata extractors for genomic files. Each extractor reads just enough of
//! one file to describe it and returns a [`Metadata`] mapping.
//!
//! # Supported Formats
//!
//! - **FASTQ**: read-name grammar, predicted sequencing technology, read-length statistics
//! - **BAM**: SAM header (`@HD`, `@RG`, `@PG`) and reference dictionary
//! - **VCF**: meta-information lines and sample columns
//!
//! Every format is also described by its file name through
//! [`filename::FilenameExtractor`] and the per-format [`keywords`] sets.
//!
//! # Example
//!
//! ```no_run
//! use seqsleuth_common::{FileFormat, ReadLimit};
//! use seqsleuth_extract::{ExtractRequest, ExtractorRegistry};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> Result<(), seqsleuth_extract::ExtractorError> {
//! let registry = ExtractorRegistry::with_defaults();
//! let cancel = CancellationToken::new();
//! let request = ExtractRequest::new("reads/HG002_R1.fastq.gz", ReadLimit::First(5), &cancel);
//! let metadata = registry.get(FileFormat::Fastq).extract(&request)?;
//! println!("{}", serde_json::to_string(&metadata).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod bam;
pub mod error;
pub mod fastq;
pub mod filename;
pub mod keywords;
pub mod reference;
pub mod registry;
pub mod source;
pub mod vcf;

// Re-export commonly used types
pub use error::{ExtractorError, Result};
pub use registry::{ExtractRequest, ExtractorRegistry, FormatExtractor};
pub use seqsleuth_common::Metadata;
