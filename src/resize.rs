//! # Resize Adapter Module
//!
//! Width normalization before encoding, delegated to external tools.
//!
//! The converter never resizes in memory: `sips` (macOS) or ImageMagick
//! (`magick`, `convert`) produce a temporary working file that the batch
//! orchestrator owns and deletes once the quality search is done.

use crate::error::OptimizeError;
use crate::platform::PlatformCommands;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Capability to resample an image to a target width.
pub trait Resizer: Send + Sync {
    /// Resize `input` to `target_width` pixels wide, preserving aspect
    /// ratio, into a freshly created temporary file.
    ///
    /// The caller owns the returned path and must delete it when done.
    fn resize(
        &self,
        input: &Path,
        target_width: u32,
    ) -> impl Future<Output = Result<PathBuf, OptimizeError>> + Send;
}

/// Resizer backed by sips or ImageMagick, tried in preference order.
pub struct ExternalResizer;

impl ExternalResizer {
    /// Tools that can resample, best first. sips is the macOS native tool
    /// the converter was built around; ImageMagick covers everything else.
    const TOOLS: &'static [&'static str] = &["sips", "magick", "convert"];

    pub fn new() -> Self {
        Self
    }

    /// Check that at least one resize tool is installed.
    pub async fn check_dependency() -> Result<(), OptimizeError> {
        let platform = PlatformCommands::instance();
        for tool in Self::TOOLS {
            if platform.is_command_available(tool).await {
                return Ok(());
            }
        }
        Err(OptimizeError::MissingDependency(
            "No resize tool found. Install ImageMagick (magick/convert) or run on macOS (sips)."
                .to_string(),
        ))
    }

    /// Allocate a unique temporary path carrying the input's extension, so
    /// the external tool infers the right output format.
    fn working_path(input: &Path) -> Result<PathBuf, OptimizeError> {
        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let temp = tempfile::Builder::new()
            .prefix("webp-batch-resize-")
            .suffix(&format!(".{}", ext))
            .tempfile()
            .map_err(OptimizeError::Io)?;

        // Detach from the delete-on-drop guard: the orchestrator deletes
        // this file after the search completes.
        temp.into_temp_path()
            .keep()
            .map_err(|e| OptimizeError::Io(e.error))
    }

    fn build_args(tool: &str, input: &Path, width: u32, output: &Path) -> Vec<String> {
        match tool {
            "sips" => vec![
                "--resampleWidth".to_string(),
                width.to_string(),
                input.to_string_lossy().into_owned(),
                "--out".to_string(),
                output.to_string_lossy().into_owned(),
            ],
            // magick / convert: bare width geometry preserves aspect ratio
            _ => vec![
                input.to_string_lossy().into_owned(),
                "-resize".to_string(),
                width.to_string(),
                output.to_string_lossy().into_owned(),
            ],
        }
    }
}

impl Default for ExternalResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Resizer for ExternalResizer {
    async fn resize(&self, input: &Path, target_width: u32) -> Result<PathBuf, OptimizeError> {
        let platform = PlatformCommands::instance();
        let output = Self::working_path(input)?;

        for tool in Self::TOOLS {
            if !platform.is_command_available(tool).await {
                continue;
            }

            let args = Self::build_args(tool, input, target_width, &output);
            debug!("Resizing with {}: {:?}", tool, args);

            let status = Command::new(platform.get_command(tool))
                .args(&args)
                .status()
                .await;

            match status {
                Ok(status) if status.success() => return Ok(output),
                Ok(status) => {
                    warn!("{} resize exited with {}, trying next tool", tool, status);
                }
                Err(e) => {
                    warn!("{} failed to spawn: {}, trying next tool", tool, e);
                }
            }
        }

        // No tool produced output; reclaim the placeholder file.
        let _ = tokio::fs::remove_file(&output).await;
        Err(OptimizeError::Resize(format!(
            "No resize tool succeeded for {}",
            input.display()
        )))
    }
}
