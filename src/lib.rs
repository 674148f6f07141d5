//! # WebP Batch Optimizer Library
//!
//! Batch-converts images to WebP by orchestrating external command-line
//! tools, searching for the encoder quality whose output size best matches
//! a target.
//!
//! ## Module layout:
//! - `config`: configuration, validation, JSON persistence
//! - `error`: typed error taxonomy
//! - `types`: content types, size presets, conversion records, summaries
//! - `search`: the target-size quality search engine
//! - `batch`: the sequential batch orchestrator
//! - `encode` / `resize` / `analysis`: external-tool capabilities behind
//!   traits (cwebp encoder, sips/ImageMagick resizer, heuristic classifier)
//! - `file_manager`: image discovery and size utilities
//! - `progress`: progress sink trait and the console bar
//! - `platform`: external tool detection
//!
//! ## Usage:
//! ```no_run
//! use webp_batch_optimizer::{
//!     analysis::{EncoderQualityScore, HeuristicClassifier},
//!     batch::BatchConverter,
//!     config::Config,
//!     encode::CwebpEncoder,
//!     progress::NullProgress,
//!     resize::ExternalResizer,
//! };
//! use std::time::Duration;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut converter = BatchConverter::new(
//!     config,
//!     std::path::Path::new("photos"),
//!     CwebpEncoder::new(Duration::from_secs(10)),
//!     ExternalResizer::new(),
//!     HeuristicClassifier::new(),
//!     EncoderQualityScore,
//! )?;
//! let summary = converter.run(&[], &NullProgress).await?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod encode;
pub mod error;
pub mod file_manager;
pub mod platform;
pub mod progress;
pub mod resize;
pub mod search;
pub mod types;

pub use batch::BatchConverter;
pub use config::Config;
pub use error::OptimizeError;
pub use search::{QualitySearch, SearchOutcome};
pub use types::{BatchSummary, ContentType, ConversionResult, OptimizationTarget};
