//! # Image Analysis Module
//!
//! Content classification and perceptual scoring live behind traits: the
//! original application used macOS Vision for face/text detection and a
//! pixel comparator for quality scores, neither of which this crate
//! reimplements. What ships here is:
//!
//! - [`HeuristicClassifier`]: a best-effort stand-in that reads only the
//!   file extension and the image header dimensions (via the `image`
//!   crate's cheap dimension probe, no pixel decoding)
//! - [`EncoderQualityScore`]: a placeholder scorer that normalizes the
//!   chosen encoder quality to [0, 1]
//!
//! Both are infallible by contract. Classification failure of any kind
//! degrades to `ContentType::Photo`.

use crate::types::ContentType;
use std::future::Future;
use std::path::Path;
use tracing::debug;

/// Pixel dimensions of common displays; images matching one exactly are
/// almost certainly screenshots.
const SCREEN_DIMENSIONS: &[(u32, u32)] = &[
    (1280, 720),
    (1366, 768),
    (1440, 900),
    (1512, 982),
    (1680, 1050),
    (1920, 1080),
    (2560, 1440),
    (2560, 1600),
    (2880, 1800),
    (3024, 1964),
    (3840, 2160),
];

/// Capability to classify an image's content.
///
/// Best-effort: implementations never fail, they fall back to a default
/// classification instead.
pub trait ContentClassifier: Send + Sync {
    fn classify(&self, path: &Path) -> impl Future<Output = ContentType> + Send;
}

/// Classifier driven by file extension and header dimensions.
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn is_screen_sized(width: u32, height: u32) -> bool {
        SCREEN_DIMENSIONS
            .iter()
            .any(|&(w, h)| (width == w && height == h) || (width == h && height == w))
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentClassifier for HeuristicClassifier {
    async fn classify(&self, path: &Path) -> ContentType {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        // Header-only probe; any read failure degrades to the default.
        let dimensions = image::image_dimensions(path).ok();

        if let Some((w, h)) = dimensions {
            if Self::is_screen_sized(w, h) {
                debug!("{} matches a screen resolution ({}x{})", path.display(), w, h);
                return ContentType::Screenshot;
            }
        }

        match ext.as_str() {
            // Scanned documents are overwhelmingly distributed as TIFF
            "tif" | "tiff" => ContentType::TextDocument,
            // Non-screenshot PNG skews toward line art and renders
            "png" => ContentType::Artwork,
            _ => ContentType::Photo,
        }
    }
}

/// Capability to score the perceptual quality of a conversion, normalized
/// to [0, 1].
pub trait QualityScorer: Send + Sync {
    fn score(
        &self,
        original: &Path,
        converted: &Path,
        chosen_quality: u8,
    ) -> impl Future<Output = f64> + Send;
}

/// Placeholder scorer derived from the encoder quality alone.
///
/// Stands in for a real perceptual metric; callers wanting SSIM-style
/// scores supply their own [`QualityScorer`].
pub struct EncoderQualityScore;

impl QualityScorer for EncoderQualityScore {
    async fn score(&self, _original: &Path, _converted: &Path, chosen_quality: u8) -> f64 {
        f64::from(chosen_quality.min(100)) / 100.0
    }
}
