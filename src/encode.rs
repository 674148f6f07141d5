//! # Encoder Adapter Module
//!
//! The quality search only needs one capability from an encoder: write a
//! WebP at a given quality and report how many bytes landed on disk. The
//! [`Encoder`] trait captures that contract; [`CwebpEncoder`] implements it
//! by spawning the external `cwebp` binary.
//!
//! The reported size is always read back from the written file, never
//! estimated from encoder output.

use crate::error::OptimizeError;
use crate::platform::PlatformCommands;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Capability to encode an image to WebP at a given quality.
pub trait Encoder: Send + Sync {
    /// Encode `input` at `quality` (0-100), writing the result to `output`.
    ///
    /// Returns the byte size of the written file. Any failure mode of the
    /// underlying tool (spawn error, non-zero exit, timeout, unreadable
    /// output) surfaces as [`OptimizeError::Encode`].
    fn encode(
        &self,
        input: &Path,
        quality: u8,
        output: &Path,
    ) -> impl Future<Output = Result<u64, OptimizeError>> + Send;
}

/// Encoder backed by the external `cwebp` tool.
pub struct CwebpEncoder {
    timeout: Duration,
}

impl CwebpEncoder {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Check that cwebp is installed before a batch starts.
    pub async fn check_dependency() -> Result<(), OptimizeError> {
        let platform = PlatformCommands::instance();
        if platform.is_command_available("cwebp").await {
            Ok(())
        } else {
            Err(OptimizeError::MissingDependency(
                "cwebp not found. Install the webp package (provides cwebp).".to_string(),
            ))
        }
    }
}

impl Encoder for CwebpEncoder {
    async fn encode(
        &self,
        input: &Path,
        quality: u8,
        output: &Path,
    ) -> Result<u64, OptimizeError> {
        let platform = PlatformCommands::instance();

        debug!(
            "cwebp -q {} {} -o {}",
            quality,
            input.display(),
            output.display()
        );

        let status = tokio::time::timeout(
            self.timeout,
            Command::new(platform.get_command("cwebp"))
                .arg("-q")
                .arg(quality.to_string())
                .arg("-m")
                .arg("4")
                .arg("-mt")
                .arg(input)
                .arg("-o")
                .arg(output)
                .status(),
        )
        .await
        .map_err(|_| {
            warn!(
                "cwebp timed out after {:?} on {}",
                self.timeout,
                input.display()
            );
            OptimizeError::Encode(format!("cwebp timed out after {:?}", self.timeout))
        })?
        .map_err(|e| OptimizeError::Encode(format!("failed to spawn cwebp: {}", e)))?;

        if !status.success() {
            return Err(OptimizeError::Encode(format!(
                "cwebp exited with {} for {}",
                status,
                input.display()
            )));
        }

        let metadata = tokio::fs::metadata(output)
            .await
            .map_err(|e| OptimizeError::Encode(format!("unreadable encoder output: {}", e)))?;

        Ok(metadata.len())
    }
}
