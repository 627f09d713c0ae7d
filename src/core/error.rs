use std::path::PathBuf;
use thiserror::Error;

/// Rejected before any frame is read.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("start time cannot be negative (got {0} s)")]
    NegativeStart(f64),
    #[error("start time ({start} s) is greater than video duration ({duration:.2} s)")]
    StartBeyondDuration { start: f64, duration: f64 },
    #[error("end time ({end} s) is greater than video duration ({duration:.2} s)")]
    EndBeyondDuration { end: f64, duration: f64 },
    #[error("end time ({end} s) must be greater than start time ({start} s)")]
    EmptyWindow { start: f64, end: f64 },
    #[error("step must be a positive number of seconds (got {0})")]
    NonPositiveStep(f64),
    #[error("scale factor must be positive (got {0})")]
    NonPositiveScale(f64),
    #[error("similarity threshold must be a finite value >= 0 (got {0})")]
    InvalidThreshold(f64),
    #[error("worker count and queue depth must be at least 1")]
    ZeroWorkers,
    #[error("window {start} s..{end} s contains no frames at {fps:.2} fps")]
    EmptyFrameRange { start: f64, end: f64, fps: f64 },
}

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("error opening video file {}: {reason}", path.display())]
    Unopenable { path: PathBuf, reason: String },
    #[error("error retrieving FPS from {}: decoder reported {fps}", path.display())]
    InvalidFrameRate { path: PathBuf, fps: f64 },
    #[error("video backend error: {0}")]
    Backend(#[from] opencv::Error),
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    Dimensions { width: u32, height: u32, expected: usize, actual: usize },
    #[error("scale {scale} turns {width}x{height} into an empty image")]
    EmptyOutput { width: u32, height: u32, scale: f64 },
    #[error("invalid image buffer: {0}")]
    Buffer(#[from] fast_image_resize::ImageBufferError),
    #[error("resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),
    #[error("timestamp overlay failed: {0}")]
    Overlay(#[from] opencv::Error),
    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Failure of a single frame; siblings and the scan keep going.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("frame {sequence}: {source}")]
    Transform {
        sequence: u64,
        #[source]
        source: TransformError,
    },
    #[error("frame {sequence}: failed to write {}: {source}", path.display())]
    Write {
        sequence: u64,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame {sequence}: worker exited before reporting a result")]
    Lost { sequence: u64 },
}

impl UnitError {
    pub fn sequence(&self) -> u64 {
        match self {
            UnitError::Transform { sequence, .. }
            | UnitError::Write { sequence, .. }
            | UnitError::Lost { sequence } => *sequence,
        }
    }
}

/// Errors that abort the whole run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot start worker threads: {0}")]
    Workers(#[source] std::io::Error),
    #[error("could not seek to start frame {index}")]
    StartSeek { index: u64 },
}
