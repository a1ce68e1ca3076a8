//! Format extractor capability and the static lookup table keyed by format

use crate::bam::BamExtractor;
use crate::error::Result;
use crate::fastq::FastqExtractor;
use crate::source::SourceOpener;
use crate::vcf::VcfExtractor;
use seqsleuth_common::{FileFormat, Metadata, ReadLimit};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything an extractor needs to describe one file
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest<'a> {
    /// Fully resolved address of the file
    pub locator: &'a str,
    /// Upper bound on records read, for read-bounded formats
    pub read_limit: ReadLimit,
    /// Checked between records; extractors stop with `ExtractorError::Cancelled`
    pub cancel: &'a CancellationToken,
}

impl<'a> ExtractRequest<'a> {
    pub fn new(locator: &'a str, read_limit: ReadLimit, cancel: &'a CancellationToken) -> Self {
        Self {
            locator,
            read_limit,
            cancel,
        }
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(crate::ExtractorError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Extracts a metadata mapping from one file of a single format.
///
/// Implementations are synchronous and may block on I/O; callers run them on
/// a blocking thread.
pub trait FormatExtractor: Send + Sync {
    /// Format this extractor understands
    fn format(&self) -> FileFormat;

    /// Describe the file at `request.locator`
    fn extract(&self, request: &ExtractRequest<'_>) -> Result<Metadata>;
}

/// One extractor per [`FileFormat`], indexed by [`FileFormat::index`]
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: [Arc<dyn FormatExtractor>; 3],
}

impl ExtractorRegistry {
    /// Registry with the built-in extractors sharing one opener
    pub fn new(opener: Arc<SourceOpener>) -> Self {
        Self {
            extractors: [
                Arc::new(FastqExtractor::new(opener.clone())),
                Arc::new(BamExtractor::new(opener.clone())),
                Arc::new(VcfExtractor::new(opener)),
            ],
        }
    }

    /// Registry with the built-in extractors and default opener settings
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SourceOpener::default()))
    }

    /// Replace the extractor registered for `extractor.format()`
    pub fn with_extractor(mut self, extractor: Arc<dyn FormatExtractor>) -> Self {
        let slot = extractor.format().index();
        self.extractors[slot] = extractor;
        self
    }

    pub fn get(&self, format: FileFormat) -> &dyn FormatExtractor {
        self.extractors[format.index()].as_ref()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field(
                "formats",
                &self.extractors.iter().map(|e| e.format()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
