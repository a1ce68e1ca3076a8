//! Streaming per-format output tables
//!
//! One CSV table per format with the header `filename,metadata`. Each row is
//! flushed as soon as it is written, so a table is durable up to the last
//! completed task even if the run is interrupted.

use crate::error::SinkError;
use crate::task::ExtractionResult;
use csv::Writer;
use seqsleuth_common::FileFormat;
use serde_json::json;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 2] = ["filename", "metadata"];

/// What to do with failed tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave failed tasks out of the table
    #[default]
    Omit,
    /// Write `{"error": reason}` as the metadata cell
    WriteRow,
}

pub struct ResultSink {
    path: PathBuf,
    writer: Writer<File>,
    policy: FailurePolicy,
    rows_written: u64,
}

impl ResultSink {
    /// Create `<output_dir>/<format>_metadata.csv` and write its header
    pub fn create(
        output_dir: &Path,
        format: FileFormat,
        policy: FailurePolicy,
    ) -> Result<Self, SinkError> {
        let path = output_dir.join(format.table_name());
        let writer = Writer::from_path(&path).map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;

        let mut sink = Self {
            path,
            writer,
            policy,
            rows_written: 0,
        };
        sink.write_record(HEADER)?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Append one result. Returns whether a row was written.
    pub fn write(&mut self, result: &ExtractionResult) -> Result<bool, SinkError> {
        let cell = match result {
            ExtractionResult::Success { locator, metadata } => serde_json::to_string(metadata)
                .map_err(|source| SinkError::Serialize {
                    locator: locator.clone(),
                    source,
                })?,
            ExtractionResult::Failure { reason, .. } => match self.policy {
                FailurePolicy::Omit => return Ok(false),
                FailurePolicy::WriteRow => json!({ "error": reason }).to_string(),
            },
        };

        self.write_record([result.locator(), cell.as_str()])?;
        self.rows_written += 1;
        Ok(true)
    }

    /// Flush and close the table, returning the number of result rows
    pub fn finish(mut self) -> Result<u64, SinkError> {
        self.writer.flush().map_err(|source| SinkError::Flush {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.rows_written)
    }

    fn write_record(&mut self, record: [&str; 2]) -> Result<(), SinkError> {
        self.writer
            .write_record(record)
            .map_err(|source| SinkError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|source| SinkError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}
