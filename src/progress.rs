//! # Progress Reporting Module
//!
//! The orchestrator reports progress through the [`ProgressSink`] trait:
//! one callback per completed image carrying `(index, total, result)`.
//! [`ConsoleProgress`] renders that as an indicatif bar for the CLI; a GUI
//! or test harness supplies its own sink.

use crate::file_manager::FileManager;
use crate::types::ConversionResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Receives one notification per completed image, in input order.
pub trait ProgressSink: Send + Sync {
    /// `index` is the zero-based position of the image in the batch's
    /// input sequence; `total` is the batch size.
    fn image_completed(&self, index: usize, total: usize, result: &ConversionResult);
}

/// Sink that ignores every notification.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn image_completed(&self, _index: usize, _total: usize, _result: &ConversionResult) {}
}

/// Terminal progress bar sink
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Finish with a final summary line
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressSink for ConsoleProgress {
    fn image_completed(&self, _index: usize, _total: usize, result: &ConversionResult) {
        let name = result
            .source_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        self.bar.inc(1);
        self.bar.set_message(format!(
            "[OK] {}: q={}, {} saved ({:.1}%)",
            name,
            result.chosen_quality,
            FileManager::format_size(result.bytes_saved()),
            result.reduction_percent()
        ));
    }
}
