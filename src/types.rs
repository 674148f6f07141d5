//! # Core Data Model
//!
//! Value types shared across the converter:
//!
//! - `ContentType`: classifier output, drives the base-quality seed
//! - `OptimizationTarget`: named size presets or a custom byte target
//! - `ConversionResult`: immutable per-image outcome record
//! - `BatchSummary`: aggregate statistics derived from the result history

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content classification of a source image.
///
/// Produced once per image by a [`ContentClassifier`](crate::analysis::ContentClassifier)
/// and never revised afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Photo,
    Screenshot,
    Artwork,
    TextDocument,
}

impl ContentType {
    /// Base encoder quality used to seed the search window.
    ///
    /// Text-heavy content needs a higher starting quality to keep glyph
    /// edges readable; photographic content tolerates more compression.
    pub fn base_quality(self) -> u8 {
        match self {
            ContentType::Screenshot | ContentType::TextDocument => 90,
            ContentType::Artwork => 85,
            ContentType::Photo => 80,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Photo => "Photo",
            ContentType::Screenshot => "Screenshot",
            ContentType::Artwork => "Artwork",
            ContentType::TextDocument => "Text Document",
        }
    }
}

/// Desired output size for a batch run.
///
/// Fixed for the duration of one batch; the search engine treats the target
/// as a soft goal and reports the closest size it could reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizationTarget {
    /// 1000 KB target
    Maximum,
    /// 500 KB target
    Balanced,
    /// 200 KB target
    Aggressive,
    /// User-supplied target in bytes
    Custom(f64),
}

impl OptimizationTarget {
    /// Target output size in bytes.
    pub fn target_size_bytes(self) -> f64 {
        match self {
            OptimizationTarget::Maximum => 1000.0 * 1024.0,
            OptimizationTarget::Balanced => 500.0 * 1024.0,
            OptimizationTarget::Aggressive => 200.0 * 1024.0,
            OptimizationTarget::Custom(bytes) => bytes,
        }
    }

    pub fn preset_name(self) -> &'static str {
        match self {
            OptimizationTarget::Maximum => "Maximum Quality",
            OptimizationTarget::Balanced => "Balanced",
            OptimizationTarget::Aggressive => "Aggressive Compression",
            OptimizationTarget::Custom(_) => "Custom",
        }
    }
}

/// Outcome of one successfully converted image.
///
/// Appended to the batch's ordered result history and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Quality the search settled on (0-100)
    pub chosen_quality: u8,
    pub original_size: u64,
    pub output_size: u64,
    pub content_type: ContentType,
    /// Normalized perceptual score in [0, 1]
    pub quality_score: f64,
}

impl ConversionResult {
    pub fn bytes_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.output_size)
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            (self.bytes_saved() as f64 / self.original_size as f64) * 100.0
        }
    }
}

/// Aggregate statistics for one batch run, recomputed from the history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub processed: usize,
    pub skipped: usize,
    pub total_bytes_saved: u64,
    pub average_quality: f64,
}

impl BatchSummary {
    /// Derive a summary from the ordered result history of a batch.
    ///
    /// `attempted` is the number of images the batch tried; images missing
    /// from the history were skipped.
    pub fn from_results(attempted: usize, results: &[ConversionResult]) -> Self {
        let processed = results.len();
        let total_bytes_saved = results.iter().map(ConversionResult::bytes_saved).sum();
        let average_quality = if processed > 0 {
            results.iter().map(|r| r.chosen_quality as f64).sum::<f64>() / processed as f64
        } else {
            0.0
        };

        Self {
            attempted,
            processed,
            skipped: attempted.saturating_sub(processed),
            total_bytes_saved,
            average_quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(quality: u8, original: u64, output: u64) -> ConversionResult {
        ConversionResult {
            source_path: PathBuf::from("in.jpg"),
            output_path: PathBuf::from("out.webp"),
            chosen_quality: quality,
            original_size: original,
            output_size: output,
            content_type: ContentType::Photo,
            quality_score: 0.8,
        }
    }

    #[test]
    fn test_base_quality_table() {
        assert_eq!(ContentType::Screenshot.base_quality(), 90);
        assert_eq!(ContentType::TextDocument.base_quality(), 90);
        assert_eq!(ContentType::Artwork.base_quality(), 85);
        assert_eq!(ContentType::Photo.base_quality(), 80);
    }

    #[test]
    fn test_preset_targets() {
        assert_eq!(OptimizationTarget::Maximum.target_size_bytes(), 1_024_000.0);
        assert_eq!(OptimizationTarget::Balanced.target_size_bytes(), 512_000.0);
        assert_eq!(OptimizationTarget::Aggressive.target_size_bytes(), 204_800.0);
        assert_eq!(OptimizationTarget::Custom(42.0).target_size_bytes(), 42.0);
    }

    #[test]
    fn test_summary_from_results() {
        let results = vec![result(80, 1000, 400), result(60, 2000, 500)];
        let summary = BatchSummary::from_results(3, &results);

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total_bytes_saved, 600 + 1500);
        assert_eq!(summary.average_quality, 70.0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_results(0, &[]);
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_reduction_percent() {
        let r = result(80, 1000, 250);
        assert_eq!(r.bytes_saved(), 750);
        assert!((r.reduction_percent() - 75.0).abs() < f64::EPSILON);
    }
}
