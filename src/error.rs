//! # Error Types Module
//!
//! Custom error taxonomy for the batch converter.
//!
//! Recovery policy:
//! - `Encode` is contained inside the quality search (a failed trial is
//!   skipped); it only reaches the caller when the terminal encode fails.
//! - `Resize` is fatal for the single image, never for the batch.
//! - `Validation` and `MissingDependency` are pre-batch hard failures.
//!
//! Classification has no error variant: the classifier is best-effort by
//! contract and degrades to a default content type.

/// Custom error types for batch WebP conversion
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Resize error: {0}")]
    Resize(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Configuration error: {0}")]
    Validation(String),
}
