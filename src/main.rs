//! # WebP Batch Optimizer - Main Entry Point
//!
//! Execution flow:
//! 1. Parse CLI arguments (input dir, width, preset, output, etc.)
//! 2. Configure logging (INFO, or DEBUG under --verbose)
//! 3. Validate inputs and check external tool dependencies
//! 4. Wire Ctrl-C to the orchestrator's cancellation channel
//! 5. Discover images and run the batch
//!
//! ```bash
//! webp-batch /path/to/images --width 1600 --preset balanced
//! webp-batch /path/to/images --target-kb 350 -o converted/
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

use webp_batch_optimizer::{
    analysis::{EncoderQualityScore, HeuristicClassifier},
    batch::BatchConverter,
    config::Config,
    encode::CwebpEncoder,
    file_manager::FileManager,
    progress::ConsoleProgress,
    resize::ExternalResizer,
    types::OptimizationTarget,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// 1000 KB target
    Maximum,
    /// 500 KB target
    Balanced,
    /// 200 KB target
    Aggressive,
}

impl From<Preset> for OptimizationTarget {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Maximum => OptimizationTarget::Maximum,
            Preset::Balanced => OptimizationTarget::Balanced,
            Preset::Aggressive => OptimizationTarget::Aggressive,
        }
    }
}

#[derive(Parser)]
#[command(name = "webp-batch")]
#[command(about = "Batch-convert images to WebP, sized toward a target")]
struct Args {
    /// Directory containing images to convert
    input_directory: PathBuf,

    /// Resample width in pixels
    #[arg(short, long, default_value = "1600")]
    width: u32,

    /// Output size preset
    #[arg(short, long, value_enum, default_value = "balanced")]
    preset: Preset,

    /// Custom target size in KB (overrides --preset)
    #[arg(long)]
    target_kb: Option<f64>,

    /// Output directory for converted files
    #[arg(short, long, default_value = "webp-output")]
    output: PathBuf,

    /// Per-encode timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    if !args.input_directory.is_dir() {
        return Err(anyhow::anyhow!(
            "Input directory does not exist: {}",
            args.input_directory.display()
        ));
    }

    let target = match args.target_kb {
        Some(kb) => OptimizationTarget::Custom(kb * 1024.0),
        None => args.preset.into(),
    };

    let config = Config {
        target_width: args.width,
        target,
        output_path: args.output,
        encode_timeout_secs: args.timeout,
    };

    // Pre-flight: the external tools must exist before anything starts.
    CwebpEncoder::check_dependency().await?;
    ExternalResizer::check_dependency().await?;

    let images = FileManager::find_images(&args.input_directory)?;
    if images.is_empty() {
        info!(
            "No images found to process in {}",
            args.input_directory.display()
        );
        return Ok(());
    }

    info!(
        "Converting {} images to WebP (target: {}, width: {})",
        images.len(),
        FileManager::format_size(config.target.target_size_bytes() as u64),
        config.target_width
    );

    // Ctrl-C stops the batch between images.
    let (stop_tx, stop_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current image before stopping");
            let _ = stop_tx.send(());
        }
    });

    let mut converter = BatchConverter::with_cancellation(
        config.clone(),
        &args.input_directory,
        CwebpEncoder::new(Duration::from_secs(config.encode_timeout_secs)),
        ExternalResizer::new(),
        HeuristicClassifier::new(),
        EncoderQualityScore,
        stop_rx,
    )?;

    let progress = ConsoleProgress::new(images.len() as u64);
    let summary = converter.run(&images, &progress).await?;
    progress.finish(&format!(
        "Converted {}/{} images | saved {}",
        summary.processed,
        summary.attempted,
        FileManager::format_size(summary.total_bytes_saved)
    ));

    info!("=== Conversion Complete ===");
    info!("Images attempted: {}", summary.attempted);
    info!("Images converted: {}", summary.processed);
    info!("Images skipped: {}", summary.skipped);
    info!(
        "Bytes saved: {}",
        FileManager::format_size(summary.total_bytes_saved)
    );
    info!("Average chosen quality: {:.1}", summary.average_quality);

    Ok(())
}
