//! # Batch Orchestrator Module
//!
//! Drives the quality search across an ordered list of source images.
//!
//! ## Per-image pipeline
//!
//! 1. Resize to a temporary working file (external tool); the orchestrator
//!    owns that file and deletes it whatever happens afterwards
//! 2. Classify content (best-effort, defaults to Photo)
//! 3. Seed the base quality from the content type
//! 4. Run the quality search, terminal-encoding into the output directory
//! 5. Record an immutable [`ConversionResult`], update running savings,
//!    notify the progress sink with `(index, total, result)`
//!
//! ## Failure semantics
//!
//! A failure on one image (missing source, resize failure, terminal encode
//! failure) is logged and that image is skipped; the batch always
//! continues. A batch with zero successes yields an empty summary, not an
//! error. Only configuration problems detected before the batch starts are
//! hard failures.
//!
//! ## Scheduling
//!
//! Images are processed strictly sequentially on one logical worker, so
//! progress notifications are index-stable and the result history and
//! savings accumulator have a single owner. Cooperative cancellation is
//! checked between images; an in-flight search finishes its image first.

use crate::{
    analysis::{ContentClassifier, QualityScorer},
    config::Config,
    encode::Encoder,
    error::OptimizeError,
    file_manager::FileManager,
    progress::ProgressSink,
    resize::Resizer,
    search::QualitySearch,
    types::{BatchSummary, ConversionResult},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Sequential batch converter over pluggable capabilities.
///
/// All collaborators are constructor arguments; the orchestrator reaches
/// into no ambient state.
pub struct BatchConverter<E, R, C, S> {
    config: Config,
    /// Base directory the source images were discovered under; output
    /// paths mirror the input-relative subtree below it.
    input_base_dir: PathBuf,
    encoder: E,
    resizer: R,
    classifier: C,
    scorer: S,
    stop_receiver: Option<broadcast::Receiver<()>>,
    /// Ordered history of every successful conversion this session.
    history: Vec<ConversionResult>,
}

impl<E, R, C, S> BatchConverter<E, R, C, S>
where
    E: Encoder,
    R: Resizer,
    C: ContentClassifier,
    S: QualityScorer,
{
    /// Create a converter, rejecting invalid configuration up front.
    ///
    /// `input_base_dir` is the directory the images were discovered
    /// under; the directory structure below it is preserved in the
    /// output directory, so equal file stems in different subdirectories
    /// never collide.
    pub fn new(
        config: Config,
        input_base_dir: &Path,
        encoder: E,
        resizer: R,
        classifier: C,
        scorer: S,
    ) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self {
            config,
            input_base_dir: input_base_dir.to_path_buf(),
            encoder,
            resizer,
            classifier,
            scorer,
            stop_receiver: None,
            history: Vec::new(),
        })
    }

    /// Create a converter that stops between images once a signal arrives
    /// on the broadcast channel.
    pub fn with_cancellation(
        config: Config,
        input_base_dir: &Path,
        encoder: E,
        resizer: R,
        classifier: C,
        scorer: S,
        stop_receiver: broadcast::Receiver<()>,
    ) -> Result<Self, OptimizeError> {
        let mut converter = Self::new(config, input_base_dir, encoder, resizer, classifier, scorer)?;
        converter.stop_receiver = Some(stop_receiver);
        Ok(converter)
    }

    fn should_stop(&mut self) -> bool {
        match self.stop_receiver.as_mut() {
            Some(receiver) => match receiver.try_recv() {
                Ok(_) => true,
                Err(broadcast::error::TryRecvError::Empty) => false,
                // Missed signals still mean somebody asked us to stop.
                Err(broadcast::error::TryRecvError::Lagged(_)) => true,
                Err(broadcast::error::TryRecvError::Closed) => false,
            },
            None => false,
        }
    }

    /// Process `images` in order, returning this run's summary.
    ///
    /// Successful conversions are appended to the session history in input
    /// order; the sink is notified once per completed image.
    pub async fn run<P: ProgressSink>(
        &mut self,
        images: &[PathBuf],
        progress: &P,
    ) -> Result<BatchSummary> {
        let total = images.len();
        let history_start = self.history.len();
        let mut attempted = 0usize;

        tokio::fs::create_dir_all(&self.config.output_path).await?;

        for (index, image) in images.iter().enumerate() {
            if self.should_stop() {
                info!("Cancellation requested, stopping after {} of {} images", index, total);
                break;
            }

            attempted += 1;
            match self.process_image(image).await {
                Ok(result) => {
                    debug!(
                        "Converted {} -> {} (q={}, {} -> {})",
                        result.source_path.display(),
                        result.output_path.display(),
                        result.chosen_quality,
                        FileManager::format_size(result.original_size),
                        FileManager::format_size(result.output_size),
                    );
                    progress.image_completed(index, total, &result);
                    self.history.push(result);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", image.display(), e);
                }
            }
        }

        let summary = BatchSummary::from_results(attempted, &self.history[history_start..]);
        info!(
            "Batch done: {} attempted, {} converted, {} skipped, {} saved",
            summary.attempted,
            summary.processed,
            summary.skipped,
            FileManager::format_size(summary.total_bytes_saved),
        );
        Ok(summary)
    }

    /// Run the full pipeline for one image.
    async fn process_image(&self, input: &Path) -> Result<ConversionResult, OptimizeError> {
        let original_size = FileManager::file_size(input)
            .await
            .map_err(|e| OptimizeError::Resize(format!("unreadable source: {}", e)))?;

        let working = self
            .resizer
            .resize(input, self.config.target_width)
            .await?;

        // Classification is best-effort by contract.
        let content_type = self.classifier.classify(&working).await;
        let base_quality = content_type.base_quality();
        debug!(
            "{} classified as {} (base quality {})",
            input.display(),
            content_type.name(),
            base_quality
        );

        let output_path = self.output_path_for(input);
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(OptimizeError::Io)?;
        }

        let search = QualitySearch::new(self.config.target.target_size_bytes())?;
        let outcome = search
            .run(&self.encoder, &working, base_quality, &output_path)
            .await;

        // The working file is ours to clean up whether the search
        // succeeded or not.
        if let Err(e) = tokio::fs::remove_file(&working).await {
            warn!("Failed to remove working file {}: {}", working.display(), e);
        }

        let outcome = outcome?;
        if outcome.best_trial_size.is_infinite() {
            warn!(
                "{}: no trial measured a size; output written at seed quality {}",
                input.display(),
                outcome.chosen_quality
            );
        }

        let quality_score = self
            .scorer
            .score(input, &output_path, outcome.chosen_quality)
            .await;

        Ok(ConversionResult {
            source_path: input.to_path_buf(),
            output_path,
            chosen_quality: outcome.chosen_quality,
            original_size,
            output_size: outcome.output_size,
            content_type,
            quality_score,
        })
    }

    /// Mirror the input-relative subtree under the output directory,
    /// swapping the extension for `.webp`. Sources outside the base dir
    /// fall back to a flat layout.
    fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let relative_dir = input
            .strip_prefix(&self.input_base_dir)
            .ok()
            .and_then(Path::parent)
            .unwrap_or(Path::new(""));

        self.config
            .output_path
            .join(relative_dir)
            .join(format!("{}.webp", stem))
    }

    /// Ordered history of every successful conversion this session.
    pub fn results(&self) -> &[ConversionResult] {
        &self.history
    }

    /// Summary over the whole session history, recomputed on demand.
    pub fn session_summary(&self) -> BatchSummary {
        BatchSummary::from_results(self.history.len(), &self.history)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentType, OptimizationTarget};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const KB: u64 = 1024;

    struct StubEncoder {
        qualities: Mutex<Vec<u8>>,
    }

    impl StubEncoder {
        fn new() -> Self {
            Self {
                qualities: Mutex::new(Vec::new()),
            }
        }
    }

    impl Encoder for StubEncoder {
        async fn encode(
            &self,
            _input: &Path,
            quality: u8,
            output: &Path,
        ) -> Result<u64, OptimizeError> {
            self.qualities.lock().unwrap().push(quality);
            std::fs::write(output, b"webp").map_err(OptimizeError::Io)?;
            Ok(u64::from(quality) * 10 * KB)
        }
    }

    /// Resizer that copies the source to a temp file, failing for any
    /// source whose name contains "bad". Records the working paths it
    /// hands out so tests can assert cleanup.
    struct StubResizer {
        working_paths: Mutex<Vec<PathBuf>>,
    }

    impl StubResizer {
        fn new() -> Self {
            Self {
                working_paths: Mutex::new(Vec::new()),
            }
        }
    }

    impl Resizer for StubResizer {
        async fn resize(&self, input: &Path, _width: u32) -> Result<PathBuf, OptimizeError> {
            if input.to_string_lossy().contains("bad") {
                return Err(OptimizeError::Resize("stub resize failure".to_string()));
            }
            let temp = tempfile::Builder::new()
                .prefix("stub-resize-")
                .suffix(".jpg")
                .tempfile()
                .map_err(OptimizeError::Io)?;
            let path = temp.into_temp_path().keep().map_err(|e| OptimizeError::Io(e.error))?;
            std::fs::copy(input, &path).map_err(OptimizeError::Io)?;
            self.working_paths.lock().unwrap().push(path.clone());
            Ok(path)
        }
    }

    struct FixedClassifier(ContentType);

    impl ContentClassifier for FixedClassifier {
        async fn classify(&self, _path: &Path) -> ContentType {
            self.0
        }
    }

    struct FixedScore(f64);

    impl QualityScorer for FixedScore {
        async fn score(&self, _original: &Path, _converted: &Path, _quality: u8) -> f64 {
            self.0
        }
    }

    struct RecordingSink {
        events: Mutex<Vec<(usize, usize, PathBuf)>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProgressSink for RecordingSink {
        fn image_completed(&self, index: usize, total: usize, result: &ConversionResult) {
            self.events
                .lock()
                .unwrap()
                .push((index, total, result.source_path.clone()));
        }
    }

    fn test_config(output: &Path) -> Config {
        Config {
            target_width: 800,
            target: OptimizationTarget::Balanced,
            output_path: output.to_path_buf(),
            encode_timeout_secs: 5,
        }
    }

    fn write_sources(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, vec![0u8; 2048]).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_skips_failed_image_and_continues() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let images = write_sources(src_dir.path(), &["one.jpg", "bad.jpg", "three.jpg"]);

        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        )
        .unwrap();

        let sink = RecordingSink::new();
        let summary = converter.run(&images, &sink).await.unwrap();

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);

        // History keeps input order with the failed image absent.
        let sources: Vec<_> = converter
            .results()
            .iter()
            .map(|r| r.source_path.clone())
            .collect();
        assert_eq!(sources, vec![images[0].clone(), images[2].clone()]);

        // Progress indices are the input positions, total is the batch size.
        let events = sink.events.lock().unwrap();
        assert_eq!(events[0].0, 0);
        assert_eq!(events[1].0, 2);
        assert!(events.iter().all(|(_, total, _)| *total == 3));

        // Outputs landed next to each other in the output directory.
        assert!(out_dir.path().join("one.webp").exists());
        assert!(out_dir.path().join("three.webp").exists());
        assert!(!out_dir.path().join("bad.webp").exists());
    }

    #[tokio::test]
    async fn test_same_stem_in_subdirs_lands_in_mirrored_tree() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(src_dir.path().join("covers")).unwrap();
        std::fs::create_dir_all(src_dir.path().join("thumbs")).unwrap();
        let images = write_sources(src_dir.path(), &["covers/x.jpg", "thumbs/x.jpg"]);

        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        )
        .unwrap();

        let summary = converter
            .run(&images, &crate::progress::NullProgress)
            .await
            .unwrap();

        assert_eq!(summary.processed, 2);

        // Same stem, different subdirectories: neither overwrites the other.
        let outputs: Vec<_> = converter
            .results()
            .iter()
            .map(|r| r.output_path.clone())
            .collect();
        assert_ne!(outputs[0], outputs[1]);
        assert!(out_dir.path().join("covers").join("x.webp").exists());
        assert!(out_dir.path().join("thumbs").join("x.webp").exists());
    }

    #[tokio::test]
    async fn test_screenshot_seed_drives_first_trial() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let images = write_sources(src_dir.path(), &["shot.png"]);

        let encoder = StubEncoder::new();
        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            encoder,
            StubResizer::new(),
            FixedClassifier(ContentType::Screenshot),
            FixedScore(0.9),
        )
        .unwrap();

        converter.run(&images, &crate::progress::NullProgress).await.unwrap();

        // Base quality 90 seeds the window [70, 100]; first midpoint 85.
        // A Photo seed of 80 would have started at 75 instead.
        let qualities = converter.encoder.qualities.lock().unwrap();
        assert_eq!(qualities[0], 85);
    }

    #[tokio::test]
    async fn test_working_files_deleted() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let images = write_sources(src_dir.path(), &["a.jpg", "b.jpg"]);

        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        )
        .unwrap();

        converter.run(&images, &crate::progress::NullProgress).await.unwrap();

        let working = converter.resizer.working_paths.lock().unwrap();
        assert_eq!(working.len(), 2);
        for path in working.iter() {
            assert!(!path.exists(), "working file left behind: {:?}", path);
        }
    }

    #[tokio::test]
    async fn test_cancellation_before_first_image() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let images = write_sources(src_dir.path(), &["a.jpg", "b.jpg"]);

        let (stop_tx, stop_rx) = broadcast::channel(1);
        let mut converter = BatchConverter::with_cancellation(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
            stop_rx,
        )
        .unwrap();

        stop_tx.send(()).unwrap();
        let summary = converter.run(&images, &crate::progress::NullProgress).await.unwrap();

        assert_eq!(summary.attempted, 0);
        assert_eq!(summary, BatchSummary::default());
        assert!(converter.results().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty_summary() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        )
        .unwrap();

        let summary = converter
            .run(&[], &crate::progress::NullProgress)
            .await
            .unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_batch() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let mut config = test_config(out_dir.path());
        config.target = OptimizationTarget::Custom(-1.0);

        let result = BatchConverter::new(
            config,
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        );
        assert!(matches!(result, Err(OptimizeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_session_history_accumulates_across_runs() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let first = write_sources(src_dir.path(), &["a.jpg"]);
        let second = write_sources(src_dir.path(), &["b.jpg"]);

        let mut converter = BatchConverter::new(
            test_config(out_dir.path()),
            src_dir.path(),
            StubEncoder::new(),
            StubResizer::new(),
            FixedClassifier(ContentType::Photo),
            FixedScore(0.9),
        )
        .unwrap();

        converter.run(&first, &crate::progress::NullProgress).await.unwrap();
        let summary = converter.run(&second, &crate::progress::NullProgress).await.unwrap();

        // The second run's summary covers only the second run.
        assert_eq!(summary.processed, 1);
        assert_eq!(converter.results().len(), 2);
        assert_eq!(converter.session_summary().processed, 2);

        converter.clear_history();
        assert!(converter.results().is_empty());
    }
}
