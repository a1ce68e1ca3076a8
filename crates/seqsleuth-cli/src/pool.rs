//! Bounded worker pool for one batch
//!
//! Every task runs the invoker on the runtime's blocking thread pool, with at
//! most `workers` extractor calls running at once. Each blocking call holds a
//! semaphore permit until its thread returns, so a task reported as timed out
//! keeps its slot until the extractor actually stops. Results are delivered
//! through a channel bounded by the same limit, in completion order, so a slow
//! consumer holds back new work instead of accumulating results.
//!
//! The pool always yields exactly one result per task:
//! - a panic inside an extractor becomes a failure (`JoinError::is_panic`)
//! - an expired deadline cancels the task's token and becomes a failure
//! - once the batch token is cancelled, tasks not yet started fail as cancelled

use crate::invoker::ExtractionInvoker;
use crate::partition::Batch;
use crate::task::{ExtractionResult, TaskDescriptor};
use futures::stream::{self, StreamExt};
use seqsleuth_common::WorkerCount;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const CANCELLED_REASON: &str = "cancelled before completion";

#[derive(Debug, Clone)]
pub struct WorkerPool {
    invoker: Arc<ExtractionInvoker>,
    workers: WorkerCount,
    task_timeout: Option<Duration>,
}

impl WorkerPool {
    pub fn new(invoker: ExtractionInvoker, workers: WorkerCount) -> Self {
        Self {
            invoker: Arc::new(invoker),
            workers,
            task_timeout: None,
        }
    }

    /// Bound every task by `timeout`
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn workers(&self) -> WorkerCount {
        self.workers
    }

    /// Start running `batch` and return the completion channel.
    ///
    /// The channel closes after the last result. Must be called within a
    /// Tokio runtime.
    pub fn spawn(&self, batch: Batch, cancel: CancellationToken) -> mpsc::Receiver<ExtractionResult> {
        let limit = self.workers.get();
        let (tx, rx) = mpsc::channel(limit);
        let invoker = self.invoker.clone();
        let timeout = self.task_timeout;

        debug!(
            format = %batch.format,
            tasks = batch.len(),
            workers = limit,
            "Starting worker pool"
        );

        let slots = Arc::new(Semaphore::new(limit));

        tokio::spawn(async move {
            let mut results = stream::iter(batch.tasks)
                .map(|task| {
                    let slot = slots.clone().acquire_owned();
                    let cancel = cancel.child_token();
                    let invoker = invoker.clone();
                    async move {
                        match slot.await {
                            Ok(permit) => run_task(invoker, task, timeout, cancel, permit).await,
                            Err(_) => ExtractionResult::failure(task.locator, CANCELLED_REASON),
                        }
                    }
                })
                .buffer_unordered(limit);

            while let Some(result) = results.next().await {
                if tx.send(result).await.is_err() {
                    warn!("Result consumer went away; stopping worker pool");
                    break;
                }
            }
        });

        rx
    }

    /// Run `batch` to completion and collect every result
    pub async fn run(&self, batch: Batch, cancel: CancellationToken) -> Vec<ExtractionResult> {
        let mut rx = self.spawn(batch, cancel);
        let mut results = Vec::new();
        while let Some(result) = rx.recv().await {
            results.push(result);
        }
        results
    }
}

async fn run_task(
    invoker: Arc<ExtractionInvoker>,
    task: TaskDescriptor,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    permit: OwnedSemaphorePermit,
) -> ExtractionResult {
    if cancel.is_cancelled() {
        debug!(locator = %task.locator, "Skipping task; batch cancelled");
        return ExtractionResult::failure(task.locator, CANCELLED_REASON);
    }

    let locator = task.locator.clone();
    let handle = tokio::task::spawn_blocking({
        let cancel = cancel.clone();
        move || {
            let _permit = permit;
            invoker.invoke(&task, &cancel)
        }
    });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // The thread keeps its permit until the extractor returns
                cancel.cancel();
                error!(
                    locator = %locator,
                    timeout_secs = limit.as_secs_f64(),
                    "Task timed out"
                );
                return ExtractionResult::failure(
                    locator,
                    format!("timed out after {:.1}s", limit.as_secs_f64()),
                );
            },
        },
        None => handle.await,
    };

    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let reason = format!("extractor panicked: {}", panic_message(e.into_panic()));
            error!(locator = %locator, error = %reason, "Error processing file");
            ExtractionResult::failure(locator, reason)
        },
        Err(e) => {
            error!(locator = %locator, error = %e, "Extraction task did not complete");
            ExtractionResult::failure(locator, e.to_string())
        },
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::invoker::tests::{scripted_invoker, task};
    use seqsleuth_common::{FileFormat, Metadata};
    use seqsleuth_extract::{ExtractRequest, ExtractorRegistry, FormatExtractor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Ignores cancellation and records how many calls overlap
    #[derive(Default)]
    struct Stuck {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl FormatExtractor for Stuck {
        fn format(&self) -> FileFormat {
            FileFormat::Bam
        }

        fn extract(&self, _request: &ExtractRequest<'_>) -> seqsleuth_extract::Result<Metadata> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(150));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Metadata::new())
        }
    }

    fn batch(locators: &[&str]) -> Batch {
        Batch {
            format: FileFormat::Fastq,
            tasks: locators.iter().map(|l| task(FileFormat::Fastq, l)).collect(),
        }
    }

    fn pool(workers: usize) -> WorkerPool {
        WorkerPool::new(scripted_invoker(), WorkerCount::new(workers).unwrap())
    }

    #[tokio::test]
    async fn test_yields_one_result_per_task() {
        let locators: Vec<String> = (0..25).map(|i| format!("/d/r{}.fastq", i)).collect();
        let refs: Vec<&str> = locators.iter().map(String::as_str).collect();

        for workers in [1, 2, 7, 64] {
            let results = pool(workers)
                .run(batch(&refs), CancellationToken::new())
                .await;
            assert_eq!(results.len(), 25, "workers = {}", workers);
            assert!(results.iter().all(ExtractionResult::is_success));
        }
    }

    #[tokio::test]
    async fn test_single_worker_keeps_submission_order() {
        let refs = ["/d/a.fastq", "/d/fail.fastq", "/d/b.fastq", "/d/c.fastq"];
        let results = pool(1).run(batch(&refs), CancellationToken::new()).await;
        let order: Vec<&str> = results.iter().map(ExtractionResult::locator).collect();
        assert_eq!(order, refs);
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_contained() {
        let refs = ["/d/a.fastq", "/d/fail.fastq", "/d/panic.fastq", "/d/b.fastq"];
        let results = pool(2).run(batch(&refs), CancellationToken::new()).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_success()).count(), 2);
        let panicked = results
            .iter()
            .find(|r| r.locator() == "/d/panic.fastq")
            .unwrap();
        match panicked {
            ExtractionResult::Failure { reason, .. } => assert!(reason.contains("panicked")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_cancels_task() {
        let pool = pool(2).with_task_timeout(Some(Duration::from_millis(50)));
        let results = pool
            .run(batch(&["/d/slow.fastq", "/d/a.fastq"]), CancellationToken::new())
            .await;

        let slow = results.iter().find(|r| r.locator() == "/d/slow.fastq").unwrap();
        match slow {
            ExtractionResult::Failure { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(results.iter().filter(|r| r.is_success()).count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_batch_still_drains() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = pool(3)
            .run(batch(&["/d/a.fastq", "/d/b.fastq", "/d/c.fastq"]), cancel)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| matches!(
            r,
            ExtractionResult::Failure { reason, .. } if reason == CANCELLED_REASON
        )));
    }

    #[tokio::test]
    async fn test_timed_out_task_keeps_its_slot() {
        let stuck = Stuck::default();
        let peak = stuck.peak.clone();
        let registry = ExtractorRegistry::with_defaults().with_extractor(Arc::new(stuck));
        let pool = WorkerPool::new(ExtractionInvoker::new(registry), WorkerCount::new(1).unwrap())
            .with_task_timeout(Some(Duration::from_millis(20)));
        let batch = Batch {
            format: FileFormat::Bam,
            tasks: (0..4)
                .map(|i| task(FileFormat::Bam, &format!("/d/s{}.bam", i)))
                .collect(),
        };

        let results = pool.run(batch, CancellationToken::new()).await;

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.is_success()));
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rerun_yields_same_results() {
        let locators: Vec<String> = (0..12)
            .map(|i| match i % 4 {
                0 => format!("/d/fail{}.fastq", i),
                _ => format!("/d/r{}_HG00{}_R1.fastq", i, i % 8 + 1),
            })
            .collect();
        let refs: Vec<&str> = locators.iter().map(String::as_str).collect();

        let keyed = |mut results: Vec<ExtractionResult>| {
            results.sort_by(|a, b| a.locator().cmp(b.locator()));
            results
        };
        let first = keyed(pool(4).run(batch(&refs), CancellationToken::new()).await);
        let second = keyed(pool(4).run(batch(&refs), CancellationToken::new()).await);

        assert_eq!(first.len(), refs.len());
        assert_eq!(first, second);
    }
}
