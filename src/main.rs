mod analyzer;
mod core;
mod decoder;
mod renderer;
mod shared;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::config::ExtractionConfig;
use crate::core::extractor::{self, RunReport};
use crate::renderer::{ImageFormat, Interpolation};
use crate::shared::constants;
use crate::utils::logger;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Extract frames from a video with scaling, duplicate skipping, multithreading, and time range selection.",
    long_about = None,
    allow_negative_numbers = true
)]
struct Cli {
    /// Path to the input video file
    video: PathBuf,
    /// Folder to save extracted frames (created if missing)
    #[arg(short, long, default_value = constants::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Scaling factor for frames
    #[arg(short, long, default_value_t = 1.0)]
    scale: f64,
    /// Start time in seconds
    #[arg(long, default_value_t = 0.0)]
    start: f64,
    /// End time in seconds (default is video duration)
    #[arg(long)]
    end: Option<f64>,
    /// Time step between sampled frames in seconds
    #[arg(long, default_value_t = 1.0)]
    step: f64,
    /// Mean squared pixel difference below which a frame counts as a repeat
    #[arg(short, long, default_value_t = 0.0)]
    threshold: f64,
    /// Keep every sampled frame, even exact repeats
    #[arg(long, default_value_t = false)]
    no_similarity: bool,
    #[arg(short, long, value_enum, default_value_t = ImageFormat::Jpg)]
    format: ImageFormat,
    /// JPEG quality (1-100)
    #[arg(long, default_value_t = constants::DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
    /// Burn the frame timestamp into the top-left corner
    #[arg(long, default_value_t = false)]
    timestamp: bool,
    /// nearest, linear, cubic or area; anything else falls back to linear
    #[arg(short, long, default_value = "linear")]
    interpolation: String,
    /// Worker threads (default: number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Frames allowed to wait for a worker before decoding pauses
    #[arg(long)]
    queue_depth: Option<usize>,
    /// Print the run summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Print every saved file
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> ExtractionConfig {
        let workers = self.workers.unwrap_or_else(num_cpus::get);
        let queue_depth = self
            .queue_depth
            .unwrap_or(workers.saturating_mul(constants::QUEUE_DEPTH_PER_WORKER));

        ExtractionConfig {
            input: self.video,
            output_dir: self.output_dir,
            scale: self.scale,
            start: self.start,
            end: self.end,
            step: self.step,
            threshold: self.threshold,
            similarity: !self.no_similarity,
            format: self.format,
            quality: self.quality,
            timestamp: self.timestamp,
            interpolation: Interpolation::from_name(&self.interpolation),
            workers,
            queue_depth,
            verbose: self.verbose,
        }
    }
}

fn print_report(report: &RunReport) {
    let s = &report.summary;
    if s.cancelled {
        println!("Extraction cancelled; in-flight frames were finished.");
    }
    println!("Finished extracting frames.");
    println!(
        "Processed: {}  Saved: {}  Skipped: {}  Failed: {}  ({:.2} s)",
        s.processed,
        s.saved,
        s.skipped,
        s.failed,
        report.elapsed.as_secs_f64()
    );
}

fn main() -> Result<()> {
    // 1. Initialize Logger (framecut-error.log / framecut-debug.log)
    logger::init();

    let cli = Cli::parse();
    let json = cli.json;
    let config = cli.into_config();
    logger::info(&format!("Config: {:?}", config));

    // 2. Ctrl-C stops the scan; frames already queued still get written
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let report = extractor::extract_frames(&config, cancel).map_err(|e| {
        logger::error(&e.to_string());
        e
    })?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report);
    }

    if !report.is_complete() {
        for failure in &report.failures {
            eprintln!("{}", failure);
        }
        eprintln!(
            "Completed with {} failed frame(s). See {} for details.",
            report.failures.len(),
            constants::ERROR_LOG_FILE
        );
        std::process::exit(constants::EXIT_PARTIAL_FAILURE);
    }

    Ok(())
}
