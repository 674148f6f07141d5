//! # Configuration Management Module
//!
//! Defines the `Config` struct with all batch parameters, validates them
//! before a run starts, and supports JSON load/save for persistence.
//!
//! ## Parameters:
//! - `target_width`: resample width in pixels applied before encoding
//! - `target`: size preset or custom byte target for the quality search
//! - `output_path`: directory receiving the converted `.webp` files
//! - `encode_timeout_secs`: per-invocation cwebp timeout, treated as an
//!   encode failure when exceeded
//!
//! ## Validation:
//! All configuration errors are rejected before the batch starts; a batch
//! never begins with an invalid target or width.

use crate::error::OptimizeError;
use crate::types::OptimizationTarget;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Widest resample width we accept; beyond this the external tools start
/// hitting their own memory limits.
pub const MAX_TARGET_WIDTH: u32 = 10_000;

/// Configuration for a batch conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Resample width in pixels (1-10000)
    pub target_width: u32,
    /// Output size target for the quality search
    pub target: OptimizationTarget,
    /// Output directory for converted files
    pub output_path: PathBuf,
    /// Timeout for a single encoder invocation, in seconds
    pub encode_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_width: 1600,
            target: OptimizationTarget::Balanced,
            output_path: PathBuf::from("webp-output"),
            encode_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.target_width == 0 || self.target_width > MAX_TARGET_WIDTH {
            return Err(OptimizeError::Validation(format!(
                "Target width must be between 1 and {}",
                MAX_TARGET_WIDTH
            )));
        }

        if self.target.target_size_bytes() <= 0.0 {
            return Err(OptimizeError::Validation(
                "Target size must be greater than zero".to_string(),
            ));
        }

        if self.encode_timeout_secs == 0 {
            return Err(OptimizeError::Validation(
                "Encoder timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from file, falling back to defaults when absent
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
