//! seqsleuth - Main entry point

use anyhow::{anyhow, Result};
use clap::Parser;
use seqsleuth_cli::invoker::ExtractionInvoker;
use seqsleuth_cli::manifest::ManifestRow;
use seqsleuth_cli::pool::WorkerPool;
use seqsleuth_cli::sink::FailurePolicy;
use seqsleuth_cli::{manifest, BatchRunner, Cli, CliError, Config, RunSummary};
use seqsleuth_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use seqsleuth_extract::source::SourceOpener;
use seqsleuth_extract::ExtractorRegistry;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long shutdown waits for extractor threads that outlived their deadline
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() {
    // Parse command-line arguments (usage errors exit with code 2)
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .output(LogOutput::Console)
        .log_file_prefix("seqsleuth")
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    if let Err(e) = run(&cli) {
        error!(error = %e, "Run failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.apply(Config::load()?)?;
    let rows = manifest::load(&cli.file_list)?;
    let runner = build_runner(&config);

    let runtime = Runtime::new().map_err(|e| anyhow!("Cannot start the async runtime: {}", e))?;
    let summary = runtime.block_on(execute(&runner, &rows));

    // Timed-out extractor threads must not hold the process open
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    // Dropped outside the runtime: the blocking HTTP client refuses async contexts
    drop(runner);

    report(&summary?)?;
    Ok(())
}

fn build_runner(config: &Config) -> BatchRunner {
    let opener = Arc::new(SourceOpener::new(config.http_timeout));
    let invoker = ExtractionInvoker::new(ExtractorRegistry::new(opener));
    let pool = WorkerPool::new(invoker, config.workers).with_task_timeout(config.task_timeout);
    let policy = if config.failure_rows {
        FailurePolicy::WriteRow
    } else {
        FailurePolicy::Omit
    };
    BatchRunner::new(pool, config.base_url.clone(), config.output_dir.clone())
        .with_read_limit(config.read_limit)
        .with_failure_policy(policy)
        .with_progress(config.progress)
}

async fn execute(runner: &BatchRunner, rows: &[ManifestRow]) -> seqsleuth_cli::Result<RunSummary> {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received; cancelling remaining tasks");
                cancel.cancel();
            }
        }
    });

    runner.run(rows, &cancel).await
}

fn report(summary: &RunSummary) -> seqsleuth_cli::Result<()> {
    let succeeded: usize = summary.batches.iter().map(|b| b.succeeded).sum();
    let failed: usize = summary.batches.iter().map(|b| b.failed).sum();
    info!(
        batches = summary.batches.len(),
        succeeded,
        failed,
        "Metadata extraction finished"
    );

    if summary.cancelled {
        return Err(CliError::incomplete("interrupted before all files were processed"));
    }

    let broken: Vec<String> = summary
        .batches
        .iter()
        .filter(|b| b.sink_error.is_some())
        .map(|b| b.format.table_name())
        .collect();
    if !broken.is_empty() {
        return Err(CliError::incomplete(format!(
            "could not write {}",
            broken.join(", ")
        )));
    }

    Ok(())
}
