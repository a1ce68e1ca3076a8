//! Progress reporting for batch runs
//!
//! Owned by the coordinating task; workers never touch it.

use indicatif::{ProgressBar, ProgressStyle};
use seqsleuth_common::FileFormat;

/// Create a simple progress bar with custom message
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Completion counter for one batch
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Visible bar when `enabled`, otherwise a hidden one that still counts
    pub fn new(format: FileFormat, total: usize, enabled: bool) -> Self {
        let bar = if enabled {
            create_progress_bar(total as u64, &format!("Extracting {} metadata", format))
        } else {
            let bar = ProgressBar::hidden();
            bar.set_length(total as u64);
            bar
        };
        Self { bar }
    }

    /// Record one completed task, success or failure
    pub fn completed(&self) {
        if self.bar.length().is_none_or(|len| self.bar.position() < len) {
            self.bar.inc(1);
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(self) {
        self.bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(100, "Processing items");
        assert_eq!(pb.length(), Some(100));
    }

    #[test]
    fn test_counter_is_bounded_by_batch_size() {
        let reporter = ProgressReporter::new(FileFormat::Bam, 2, false);
        for _ in 0..3 {
            reporter.completed();
        }
        assert_eq!(reporter.position(), 2);
        reporter.finish();
    }
}
