//! Failure-isolating wrapper around one file's metadata extraction

use crate::task::{ExtractionResult, TaskDescriptor};
use seqsleuth_common::Metadata;
use seqsleuth_extract::filename::FilenameExtractor;
use seqsleuth_extract::{keywords, ExtractRequest, ExtractorRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Runs the format extractor and the filename extractor for one task and
/// merges their output. Never returns an error: failures become
/// [`ExtractionResult::Failure`] after being logged once.
#[derive(Debug, Clone, Default)]
pub struct ExtractionInvoker {
    registry: ExtractorRegistry,
    filename: FilenameExtractor,
}

impl ExtractionInvoker {
    pub fn new(registry: ExtractorRegistry) -> Self {
        Self {
            registry,
            filename: FilenameExtractor::new(),
        }
    }

    /// Describe one file. Blocks on I/O; call from a blocking thread.
    pub fn invoke(&self, task: &TaskDescriptor, cancel: &CancellationToken) -> ExtractionResult {
        debug!(format = %task.format, locator = %task.locator, "Processing file");

        match self.extract(task, cancel) {
            Ok(metadata) => ExtractionResult::Success {
                locator: task.locator.clone(),
                metadata,
            },
            Err(e) => {
                error!(
                    format = %task.format,
                    locator = %task.locator,
                    error = %e,
                    "Error processing file"
                );
                ExtractionResult::failure(task.locator.clone(), e.to_string())
            },
        }
    }

    fn extract(
        &self,
        task: &TaskDescriptor,
        cancel: &CancellationToken,
    ) -> seqsleuth_extract::Result<Metadata> {
        let request = ExtractRequest::new(&task.locator, task.read_limit, cancel);
        let mut metadata = self.registry.get(task.format).extract(&request)?;

        // Filename-derived values win on conflict
        let from_name = self
            .filename
            .extract(keywords::for_format(task.format), &task.locator)?;
        metadata.extend(from_name);

        Ok(metadata)
    }
}
