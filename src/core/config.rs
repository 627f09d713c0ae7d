use serde::Serialize;
use std::path::PathBuf;

use crate::analyzer::SimilarityFilter;
use crate::core::error::ConfigError;
use crate::decoder::VideoMetadata;
use crate::renderer::{ImageFormat, Interpolation, TransformOptions};

/// Everything a run needs, before it has been checked against the video.
#[derive(Clone, Debug)]
pub struct ExtractionConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub scale: f64,
    pub start: f64,
    /// `None` means the end of the video.
    pub end: Option<f64>,
    pub step: f64,
    pub threshold: f64,
    pub similarity: bool,
    pub format: ImageFormat,
    pub quality: u8,
    pub timestamp: bool,
    pub interpolation: Interpolation,
    pub workers: usize,
    pub queue_depth: usize,
    pub verbose: bool,
}

/// The time window translated into frame positions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplingPlan {
    pub fps: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub step: f64,
    /// First frame visited, `floor(start_time * fps)`.
    pub start_index: u64,
    /// Exclusive bound, `floor(end_time * fps)`.
    pub end_index: u64,
    /// Frames advanced per iteration, never less than one.
    pub skip_frames: u64,
}

impl SamplingPlan {
    pub fn new(fps: f64, start_time: f64, end_time: f64, step: f64) -> Self {
        let start_index = (start_time * fps).floor() as u64;
        let end_index = (end_time * fps).floor() as u64;
        let skip_frames = ((step * fps).round() as u64).max(1);
        Self { fps, start_time, end_time, step, start_index, end_index, skip_frames }
    }

    /// Upper bound on frames the scan will visit.
    pub fn max_visits(&self) -> u64 {
        let span = self.end_index.saturating_sub(self.start_index);
        (span + self.skip_frames - 1) / self.skip_frames
    }
}

impl ExtractionConfig {
    /// Validates the options that do not depend on the video.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale > 0.0 && self.scale.is_finite()) {
            return Err(ConfigError::NonPositiveScale(self.scale));
        }
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(ConfigError::NonPositiveStep(self.step));
        }
        if !(self.threshold >= 0.0 && self.threshold.is_finite()) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.workers == 0 || self.queue_depth == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if !(self.start >= 0.0) {
            return Err(ConfigError::NegativeStart(self.start));
        }
        Ok(())
    }

    /// Checks the window against the opened video and derives frame positions.
    pub fn resolve(&self, metadata: &VideoMetadata) -> Result<SamplingPlan, ConfigError> {
        self.validate()?;

        let duration = metadata.duration();
        let start = self.start;
        let end = self.end.unwrap_or(duration);

        if start > duration {
            return Err(ConfigError::StartBeyondDuration { start, duration });
        }
        if !(end <= duration) {
            return Err(ConfigError::EndBeyondDuration { end, duration });
        }
        if end <= start {
            return Err(ConfigError::EmptyWindow { start, end });
        }

        let plan = SamplingPlan::new(metadata.fps, start, end, self.step);
        if plan.start_index >= plan.end_index {
            return Err(ConfigError::EmptyFrameRange { start, end, fps: metadata.fps });
        }
        Ok(plan)
    }

    pub fn similarity_filter(&self) -> Option<SimilarityFilter> {
        self.similarity.then(|| SimilarityFilter::new(self.threshold))
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            scale: self.scale,
            interpolation: self.interpolation,
            format: self.format,
            quality: self.quality,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config(input: &str, output_dir: PathBuf) -> ExtractionConfig {
    ExtractionConfig {
        input: PathBuf::from(input),
        output_dir,
        scale: 1.0,
        start: 0.0,
        end: None,
        step: 1.0,
        threshold: 0.0,
        similarity: false,
        format: ImageFormat::Png,
        quality: 90,
        timestamp: false,
        interpolation: Interpolation::Linear,
        workers: 2,
        queue_depth: 4,
        verbose: false,
    }
}
