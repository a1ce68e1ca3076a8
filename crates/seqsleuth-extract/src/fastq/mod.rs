//! FASTQ metadata extraction
//!
//! A FASTQ file is described in two passes over the same locator: the first
//! predicts the sequencing technology from a fixed sample of headers, the
//! second reads up to the request's read limit and parses the read names
//! according to that technology.

pub mod reader;
pub mod readnames;
pub mod tech;

pub use reader::{FastqReader, FastqRecord, FastqSummary};
pub use readnames::ReadNameExtractor;
pub use tech::{HeaderTechPredictor, SequencingTech, TechPredictor};

use crate::error::{ExtractorError, Result};
use crate::registry::{ExtractRequest, FormatExtractor};
use crate::source::SourceOpener;
use seqsleuth_common::{FileFormat, Metadata};
use std::sync::Arc;
use tracing::debug;

pub struct FastqExtractor {
    opener: Arc<SourceOpener>,
    predictor: Arc<dyn TechPredictor>,
    readnames: ReadNameExtractor,
}

impl FastqExtractor {
    pub fn new(opener: Arc<SourceOpener>) -> Self {
        let predictor = Arc::new(HeaderTechPredictor::new(opener.clone()));
        Self {
            opener,
            predictor,
            readnames: ReadNameExtractor,
        }
    }

    /// Use a different technology predictor
    pub fn with_predictor(mut self, predictor: Arc<dyn TechPredictor>) -> Self {
        self.predictor = predictor;
        self
    }
}

impl FormatExtractor for FastqExtractor {
    fn format(&self) -> FileFormat {
        FileFormat::Fastq
    }

    fn extract(&self, request: &ExtractRequest<'_>) -> Result<Metadata> {
        let tech = self.predictor.predict(request)?;
        request.ensure_active()?;

        let reader = self.opener.open(request.locator)?;
        let summary = reader::summarize(reader, request)?;
        if summary.reads == 0 {
            return Err(ExtractorError::Empty(request.locator.to_string()));
        }

        debug!(
            locator = %request.locator,
            reads = summary.reads,
            tech = %tech,
            "Summarized FASTQ reads"
        );
        Ok(self.readnames.extract(tech, &summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use seqsleuth_common::ReadLimit;
    use serde_json::json;
    use std::io::Write;
    use tokio_util::sync::CancellationToken;

    struct AlwaysPacBio;

    impl TechPredictor for AlwaysPacBio {
        fn predict(&self, _request: &ExtractRequest<'_>) -> Result<SequencingTech> {
            Ok(SequencingTech::PacBio)
        }
    }

    fn illumina_reads(count: usize) -> String {
        (0..count)
            .map(|i| format!("@A00123:8:H5KJ7DSXX:1:1101:{}:1000 1:N:0:ACGT\nACGTACGT\n+\nIIIIIIII\n", i))
            .collect()
    }

    #[test]
    fn test_extract_gzipped_fastq() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HG002_R1.fastq.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(illumina_reads(10).as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let cancel = CancellationToken::new();
        let locator = path.to_str().unwrap();
        let request = ExtractRequest::new(locator, ReadLimit::First(5), &cancel);
        let metadata = FastqExtractor::new(Arc::new(SourceOpener::default()))
            .extract(&request)
            .unwrap();

        assert_eq!(metadata["sequencing_tech"], json!("illumina"));
        assert_eq!(metadata["flowcell_id"], json!("H5KJ7DSXX"));
        assert_eq!(metadata["reads_sampled"], json!(5));
    }

    #[test]
    fn test_custom_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fastq");
        std::fs::write(&path, illumina_reads(2)).unwrap();

        let cancel = CancellationToken::new();
        let locator = path.to_str().unwrap();
        let request = ExtractRequest::new(locator, ReadLimit::All, &cancel);
        let metadata = FastqExtractor::new(Arc::new(SourceOpener::default()))
            .with_predictor(Arc::new(AlwaysPacBio))
            .extract(&request)
            .unwrap();

        assert_eq!(metadata["sequencing_tech"], json!("pacbio"));
        assert_eq!(metadata["reads_sampled"], json!(2));
    }

    #[test]
    fn test_empty_fastq_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.fastq");
        std::fs::write(&path, "").unwrap();

        let cancel = CancellationToken::new();
        let locator = path.to_str().unwrap();
        let request = ExtractRequest::new(locator, ReadLimit::All, &cancel);
        let result = FastqExtractor::new(Arc::new(SourceOpener::default())).extract(&request);
        assert!(matches!(result, Err(ExtractorError::Empty(_))));
    }
}
