//! # File Management Module
//!
//! Image discovery and small filesystem utilities.
//!
//! ## Responsibilities:
//! - Recursive discovery of convertible images in a directory
//! - File size queries
//! - Human-readable size formatting
//!
//! Supported input formats are the ones `cwebp` can read directly:
//! JPG, JPEG, PNG, TIFF, BMP.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in bytes
    pub async fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).await?;
        Ok(metadata.len())
    }

    /// Find all convertible images under a directory, in stable sorted order
    pub fn find_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| Self::is_supported_image(p))
            .collect();

        // Directory iteration order is filesystem-dependent; the batch
        // contract promises a stable image ordering.
        files.sort();
        Ok(files)
    }

    /// Check if a file is a supported input image
    pub fn is_supported_image(path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext_lower = ext.to_string_lossy().to_lowercase();
                matches!(
                    ext_lower.as_str(),
                    "jpg" | "jpeg" | "png" | "tif" | "tiff" | "bmp"
                )
            }
            None => false,
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
