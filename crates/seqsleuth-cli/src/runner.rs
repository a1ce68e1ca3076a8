//! Batch runner
//!
//! Processes one format at a time, in the order FASTQ, BAM, VCF. For each
//! batch the output table is opened before the pool starts, every result is
//! written as it arrives, and the table is closed only after the pool has
//! drained.

use crate::error::{CliError, Result, SinkError};
use crate::manifest::ManifestRow;
use crate::partition::{partition, Batch};
use crate::pool::WorkerPool;
use crate::progress::ProgressReporter;
use crate::sink::{FailurePolicy, ResultSink};
use seqsleuth_common::{FileFormat, ReadLimit};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How one batch went
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub format: FileFormat,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows_written: u64,
    pub elapsed: Duration,
    /// Set when the table could not be created or written
    pub sink_error: Option<String>,
}

/// How the whole run went
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub batches: Vec<BatchSummary>,
    /// The run was interrupted before every batch finished
    pub cancelled: bool,
}

impl RunSummary {
    /// Every batch produced its table and the run was not interrupted
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.batches.iter().all(|b| b.sink_error.is_none())
    }

    pub fn batch(&self, format: FileFormat) -> Option<&BatchSummary> {
        self.batches.iter().find(|b| b.format == format)
    }
}

pub struct BatchRunner {
    pool: WorkerPool,
    base_url: String,
    read_limit: ReadLimit,
    output_dir: PathBuf,
    failure_policy: FailurePolicy,
    progress: bool,
}

impl BatchRunner {
    pub fn new(pool: WorkerPool, base_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            base_url: base_url.into(),
            read_limit: ReadLimit::default(),
            output_dir: output_dir.into(),
            failure_policy: FailurePolicy::default(),
            progress: false,
        }
    }

    pub fn with_read_limit(mut self, read_limit: ReadLimit) -> Self {
        self.read_limit = read_limit;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Run every batch in `rows`.
    ///
    /// Fails early only for a malformed manifest or an unusable output
    /// directory. Table write failures end that format's batch and are
    /// reported in the summary.
    pub async fn run(&self, rows: &[ManifestRow], cancel: &CancellationToken) -> Result<RunSummary> {
        let batches = partition(rows, &self.base_url, self.read_limit)?;
        ensure_output_dir(&self.output_dir)?;

        info!(
            rows = rows.len(),
            batches = batches.len(),
            workers = self.pool.workers().get(),
            read_limit = %self.read_limit,
            "Starting metadata extraction"
        );

        let mut summary = RunSummary::default();
        for batch in batches {
            if cancel.is_cancelled() {
                warn!(format = %batch.format, "Run cancelled; skipping remaining batches");
                summary.cancelled = true;
                break;
            }
            summary.batches.push(self.run_batch(batch, cancel).await);
        }
        summary.cancelled |= cancel.is_cancelled();

        Ok(summary)
    }

    async fn run_batch(&self, batch: Batch, cancel: &CancellationToken) -> BatchSummary {
        let started = Instant::now();
        let mut summary = BatchSummary {
            format: batch.format,
            total: batch.len(),
            succeeded: 0,
            failed: 0,
            rows_written: 0,
            elapsed: Duration::ZERO,
            sink_error: None,
        };

        let mut sink = match ResultSink::create(&self.output_dir, batch.format, self.failure_policy) {
            Ok(sink) => Some(sink),
            Err(e) => {
                error!(format = %batch.format, error = %e, "Cannot open output table; skipping batch");
                summary.sink_error = Some(e.to_string());
                summary.elapsed = started.elapsed();
                return summary;
            },
        };

        let batch_cancel = cancel.child_token();
        let reporter = ProgressReporter::new(batch.format, batch.len(), self.progress);
        let format = batch.format;
        let mut results = self.pool.spawn(batch, batch_cancel.clone());

        while let Some(result) = results.recv().await {
            reporter.completed();
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }

            let Some(open) = sink.as_mut() else {
                continue;
            };
            if let Err(e) = open.write(&result) {
                // Keep draining so every started task is accounted for
                error!(format = %format, error = %e, "Output table write failed; cancelling batch");
                summary.sink_error = Some(e.to_string());
                summary.rows_written = open.rows_written();
                batch_cancel.cancel();
                sink = None;
            }
        }
        reporter.finish();

        if let Some(open) = sink {
            match finish_sink(open) {
                Ok(rows) => summary.rows_written = rows,
                Err(e) => {
                    error!(format = %format, error = %e, "Cannot flush output table");
                    summary.sink_error = Some(e.to_string());
                },
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            format = %summary.format,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            rows_written = summary.rows_written,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Batch complete"
        );
        summary
    }
}

fn finish_sink(sink: ResultSink) -> std::result::Result<u64, SinkError> {
    let path = sink.path().display().to_string();
    let rows = sink.finish()?;
    info!(path = %path, rows, "Wrote output table");
    Ok(rows)
}

/// Create the output directory if it does not exist yet
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|source| CliError::OutputDir {
        path: path.to_path_buf(),
        source,
    })?;
    warn!(
        path = %path.display(),
        "The output directory did not exist and was created"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::invoker::tests::scripted_invoker;
    use seqsleuth_common::WorkerCount;

    fn runner(output_dir: &Path, workers: usize) -> BatchRunner {
        let pool = WorkerPool::new(scripted_invoker(), WorkerCount::new(workers).unwrap());
        BatchRunner::new(pool, "/mirror", output_dir)
    }

    fn table_rows(path: &Path) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[tokio::test]
    async fn test_one_table_per_present_format() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            ManifestRow::new(2, "fastq", "/giab/ftp/data", "a_R1.fastq.gz"),
            ManifestRow::new(3, "bam", "/giab/ftp/data", "b.bam"),
            ManifestRow::new(4, "fastq", "/giab/ftp/data", "c_R2.fastq.gz"),
        ];

        let summary = runner(dir.path(), 2)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.batches.len(), 2);
        assert_eq!(summary.batch(FileFormat::Fastq).unwrap().rows_written, 2);
        assert_eq!(table_rows(&dir.path().join("fastq_metadata.csv")), 2);
        assert_eq!(table_rows(&dir.path().join("bam_metadata.csv")), 1);
        assert!(!dir.path().join("vcf_metadata.csv").exists());
    }

    #[tokio::test]
    async fn test_failed_task_is_omitted_or_written() {
        let rows: Vec<ManifestRow> = ["a.vcf", "fail.vcf", "b.vcf"]
            .iter()
            .enumerate()
            .map(|(i, name)| ManifestRow::new(i as u64 + 2, "vcf", "data", name))
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let summary = runner(dir.path(), 3)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap();
        let batch = summary.batch(FileFormat::Vcf).unwrap();
        assert_eq!((batch.succeeded, batch.failed, batch.rows_written), (2, 1, 2));
        assert_eq!(table_rows(&dir.path().join("vcf_metadata.csv")), 2);

        let dir = tempfile::tempdir().unwrap();
        runner(dir.path(), 3)
            .with_failure_policy(FailurePolicy::WriteRow)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(table_rows(&dir.path().join("vcf_metadata.csv")), 3);
    }

    #[tokio::test]
    async fn test_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out/nested");
        let rows = vec![ManifestRow::new(2, "bam", "data", "x.bam")];

        runner(&nested, 1)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap();
        assert!(nested.join("bam_metadata.csv").exists());
    }

    #[tokio::test]
    async fn test_malformed_manifest_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = vec![
            ManifestRow::new(2, "fastq", "data", "a.fastq"),
            ManifestRow::new(3, "bam", "data", "b.bam"),
        ];
        rows[1].filetype = None;

        let err = runner(dir.path(), 1)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Manifest(_)));
        assert!(!dir.path().join("fastq_metadata.csv").exists());
    }

    #[tokio::test]
    async fn test_cancelled_run_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![ManifestRow::new(2, "bam", "data", "x.bam")];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = runner(dir.path(), 1).run(&rows, &cancel).await.unwrap();
        assert!(summary.cancelled);
        assert!(!summary.is_complete());
        assert!(summary.batches.is_empty());
    }

    #[tokio::test]
    async fn test_table_failure_is_isolated_to_its_format() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fastq_metadata.csv")).unwrap();
        let rows = vec![
            ManifestRow::new(2, "fastq", "data", "a.fastq"),
            ManifestRow::new(3, "bam", "data", "b.bam"),
        ];

        let summary = runner(dir.path(), 2)
            .run(&rows, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!summary.is_complete());
        assert!(!summary.cancelled);
        assert!(summary.batch(FileFormat::Fastq).unwrap().sink_error.is_some());
        let bam = summary.batch(FileFormat::Bam).unwrap();
        assert!(bam.sink_error.is_none());
        assert_eq!(bam.rows_written, 1);
        assert_eq!(table_rows(&dir.path().join("bam_metadata.csv")), 1);
    }
}
