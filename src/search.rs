//! # Quality Search Engine
//!
//! Finds the cwebp quality value whose output size best approximates a
//! target, using as few encoder invocations as possible.
//!
//! ## Algorithm
//!
//! The search bisects a quality window seeded asymmetrically around a
//! content-aware base quality: `[base - 20, base + 10]`, clamped to
//! `[0, 100]`. Lowering quality shrinks output far more predictably than
//! raising it, so the window leans toward lower values. Each trial encodes
//! to a disposable temporary file, measures the written size, keeps the
//! best-by-distance-to-target result, and narrows the window around the
//! midpoint. The loop stops once the window is within 5 quality points
//! (differences below that are imperceptible) or the trial budget of 8 is
//! spent, then a terminal encode at the winning quality writes the real
//! output.
//!
//! ## Failure containment
//!
//! A failed trial consumes an attempt but neither updates the best result
//! nor moves the window; termination is then guaranteed by the budget
//! alone. If every trial fails, the engine falls back to the base quality
//! and reports `f64::INFINITY` as the best trial size, meaning "size
//! unknown" - a soft failure the caller must not treat as fatal. Only a
//! failed terminal encode is a hard error.

use crate::encode::Encoder;
use crate::error::OptimizeError;
use std::path::Path;
use tracing::{debug, warn};

/// Hard budget of speculative trial encodes per image.
pub const MAX_TRIAL_ATTEMPTS: u32 = 8;

/// Stop narrowing once the window is this tight; the quality difference is
/// below what a viewer can perceive.
pub const WINDOW_TOLERANCE: i32 = 5;

/// Mutable state of one search invocation.
///
/// Invariant: `0 <= min_quality <= max_quality <= 100` whenever the window
/// is live; `best_size` starts at infinity and its distance to the target
/// only ever shrinks.
#[derive(Debug)]
struct SearchState {
    min_quality: i32,
    max_quality: i32,
    best_quality: u8,
    best_size: f64,
    attempts: u32,
}

impl SearchState {
    /// Seed the window asymmetrically around the base quality.
    fn seeded(base_quality: u8) -> Self {
        let base = i32::from(base_quality.min(100));
        Self {
            min_quality: (base - 20).max(0),
            max_quality: (base + 10).min(100),
            best_quality: base as u8,
            best_size: f64::INFINITY,
            attempts: 0,
        }
    }

    /// Negative when the window is inverted, which keeps the loop from
    /// ever running on a malformed window.
    fn window_width(&self) -> i32 {
        self.max_quality - self.min_quality
    }

    fn midpoint(&self) -> u8 {
        ((self.min_quality + self.max_quality) / 2) as u8
    }

    /// Record a measured trial, keeping it if it lands closer to the
    /// target than anything seen so far, then bisect around it.
    fn observe(&mut self, quality: u8, size: f64, target: f64) {
        if (size - target).abs() < (self.best_size - target).abs() {
            self.best_quality = quality;
            self.best_size = size;
        }

        if size > target {
            // Still too large: only lower qualities can help.
            self.max_quality = i32::from(quality) - 1;
        } else {
            self.min_quality = i32::from(quality) + 1;
        }
    }
}

/// Outcome of one quality search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Quality of the trial that came closest to the target (or the base
    /// quality when no trial succeeded).
    pub chosen_quality: u8,
    /// Byte size of that best trial; `f64::INFINITY` means no trial ever
    /// succeeded and the size is unknown.
    pub best_trial_size: f64,
    /// Measured size of the terminal encode at the chosen quality. May
    /// differ slightly from `best_trial_size` if the encoder is
    /// non-deterministic; the terminal output is canonical.
    pub output_size: u64,
    /// Trial encodes consumed, successful or not.
    pub attempts_used: u32,
}

/// Target-size quality optimizer over an [`Encoder`] capability.
pub struct QualitySearch {
    target_size_bytes: f64,
}

impl QualitySearch {
    pub fn new(target_size_bytes: f64) -> Result<Self, OptimizeError> {
        if target_size_bytes <= 0.0 {
            return Err(OptimizeError::Validation(
                "Target size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { target_size_bytes })
    }

    /// Run the bounded search, then write the terminal encode to `output`.
    ///
    /// Performs at most [`MAX_TRIAL_ATTEMPTS`] trial encodes plus exactly
    /// one terminal encode. Every trial's temporary file is removed before
    /// this function returns, regardless of outcome.
    pub async fn run<E: Encoder>(
        &self,
        encoder: &E,
        input: &Path,
        base_quality: u8,
        output: &Path,
    ) -> Result<SearchOutcome, OptimizeError> {
        let target = self.target_size_bytes;
        let mut state = SearchState::seeded(base_quality);

        debug!(
            "Quality search: target {:.0} bytes, window [{}, {}]",
            target, state.min_quality, state.max_quality
        );

        while state.window_width() > WINDOW_TOLERANCE && state.attempts < MAX_TRIAL_ATTEMPTS {
            state.attempts += 1;
            let q = state.midpoint();

            // Delete-on-drop trial output; the random name also keeps
            // concurrent searches from colliding in the temp directory.
            let trial = tempfile::Builder::new()
                .prefix("webp-batch-trial-")
                .suffix(".webp")
                .tempfile()
                .map_err(OptimizeError::Io)?;

            match encoder.encode(input, q, trial.path()).await {
                Ok(size) => {
                    debug!("Trial {} at q={}: {} bytes", state.attempts, q, size);
                    state.observe(q, size as f64, target);
                }
                Err(e) => {
                    // Attempt consumed, window untouched: the budget alone
                    // bounds the loop from here on.
                    warn!("Trial {} at q={} failed: {}", state.attempts, q, e);
                }
            }
        }

        if state.best_size.is_infinite() && state.attempts > 0 {
            warn!(
                "All {} trials failed for {}; falling back to base quality {}",
                state.attempts,
                input.display(),
                base_quality
            );
        }

        // Terminal confirmatory encode into the real output path.
        let output_size = encoder.encode(input, state.best_quality, output).await?;

        debug!(
            "Search settled on q={} ({} bytes written) after {} trials",
            state.best_quality, output_size, state.attempts
        );

        Ok(SearchOutcome {
            chosen_quality: state.best_quality,
            best_trial_size: state.best_size,
            output_size,
            attempts_used: state.attempts,
        })
    }
}
