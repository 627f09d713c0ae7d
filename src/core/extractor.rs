use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{ExtractionConfig, SamplingPlan};
use crate::core::error::{ExtractError, UnitError};
use crate::core::sampler::{RunSummary, Sampler};
use crate::core::worker_pool::{WorkUnit, WorkerPool};
use crate::decoder::{OpenCvSource, VideoSource};
use crate::renderer::{FrameTransform, OutputWriter};
use crate::utils::logger;
use crate::utils::time_utils::Timer;

/// Everything known once the pool has drained.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub plan: SamplingPlan,
    /// Written files in sequence order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<UnitError>,
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct ReportJson<'a> {
    summary: &'a RunSummary,
    plan: &'a SamplingPlan,
    written: &'a [PathBuf],
    failures: Vec<String>,
    elapsed_ms: u128,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ReportJson {
            summary: &self.summary,
            plan: &self.plan,
            written: &self.written,
            failures: self.failures.iter().map(|e| e.to_string()).collect(),
            elapsed_ms: self.elapsed.as_millis(),
        })
    }
}

/// Opens `config.input` with OpenCV and runs the extraction.
pub fn extract_frames(config: &ExtractionConfig, cancel: Arc<AtomicBool>) -> Result<RunReport, ExtractError> {
    config.validate()?;
    let mut source = OpenCvSource::open(&config.input)?;
    logger::debug(&format!("Source ready: {}", source.path().display()));
    run_extraction(&mut source, config, cancel)
}

/// Validates the window, scans `source`, and waits for every submitted frame.
pub fn run_extraction<S: VideoSource + ?Sized>(
    source: &mut S,
    config: &ExtractionConfig,
    cancel: Arc<AtomicBool>,
) -> Result<RunReport, ExtractError> {
    let timer = Timer::new();
    let metadata = source.metadata();
    let plan = config.resolve(&metadata)?;

    println!("Video duration: {:.2} seconds, FPS: {:.2}", metadata.duration(), metadata.fps);
    println!(
        "Extracting frames from {} s to {} s with a step of {} s",
        plan.start_time, plan.end_time, plan.step
    );
    logger::info(&format!(
        "Plan: frames {}..{} stride {} (up to {} visits), similarity {}",
        plan.start_index,
        plan.end_index,
        plan.skip_frames,
        plan.max_visits(),
        match config.similarity_filter() {
            Some(filter) => format!("threshold {}", filter.threshold()),
            None => "off".to_string(),
        }
    ));

    let writer = OutputWriter::new(&config.output_dir, config.format);
    writer.prepare()?;

    println!("Using {} threads for processing.", config.workers);

    let options = config.transform_options();
    let verbose = config.verbose;
    let job_writer = writer.clone();
    let mut pool = WorkerPool::new(config.workers, config.queue_depth, move |unit: WorkUnit| {
        let WorkUnit { frame, sequence } = unit;
        let bytes = FrameTransform::transform(frame, &options)
            .map_err(|source| UnitError::Transform { sequence, source })?;
        let path = job_writer.write(&bytes, sequence)?;
        if verbose {
            println!("Saved {}", path.display());
        }
        Ok(path)
    })
    .map_err(ExtractError::Workers)?;

    let mut summary = Sampler::new(source, plan, config.similarity_filter())
        .with_cancel(cancel)
        .run(&mut pool);

    logger::debug(&format!(
        "Scan finished, waiting on {} submitted unit(s) bound for {}",
        pool.submitted(),
        writer.directory().display()
    ));
    let report = pool.drain();
    summary.failed = report.failures.len() as u64;
    if summary.seek_failed {
        return Err(ExtractError::StartSeek { index: plan.start_index });
    }

    let elapsed = timer.elapsed();
    logger::info(&format!(
        "Drained in {} ms: processed={} saved={} skipped={} failed={} cancelled={}",
        timer.elapsed_ms(),
        summary.processed,
        summary.saved,
        summary.skipped,
        summary.failed,
        summary.cancelled
    ));

    Ok(RunReport {
        summary,
        plan,
        written: report.written.into_iter().map(|(_, path)| path).collect(),
        failures: report.failures,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::test_config;
    use crate::core::error::{ConfigError, TransformError};
    use crate::decoder::synthetic::SyntheticSource;
    use crate::utils::file_utils;

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn no_cancel() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn test_ten_second_video_one_second_step() {
        let dir = fresh_dir("framecut_test_extract_ten");
        let config = test_config("synthetic", dir.clone());
        let mut source = SyntheticSource::new(30.0, 300, 8, 6);

        let report = run_extraction(&mut source, &config, no_cancel()).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.summary.saved, 10);
        assert_eq!(report.summary.skipped, 0);
        let files = file_utils::list_files(&dir, "png").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        let expected: Vec<String> = (0..10).map(|n| format!("frame_{:06}.png", n)).collect();
        assert_eq!(names, expected);
        assert_eq!(report.written, files);
    }

    #[test]
    fn test_written_frames_follow_submission_order() {
        let dir = fresh_dir("framecut_test_extract_order");
        let mut config = test_config("synthetic", dir.clone());
        config.workers = 4;
        config.queue_depth = 2;
        // every sampled frame has its own flat shade
        let mut source = SyntheticSource::with_shade(30.0, 300, 8, 6, |i| (i / 30) as u8 * 20);

        let report = run_extraction(&mut source, &config, no_cancel()).unwrap();

        assert_eq!(report.written.len(), 10);
        for (seq, path) in report.written.iter().enumerate() {
            let img = image::open(path).unwrap().to_rgb8();
            assert_eq!(img.get_pixel(0, 0).0[0], seq as u8 * 20);
        }
    }

    #[test]
    fn test_end_past_duration_aborts_before_reading() {
        let dir = fresh_dir("framecut_test_extract_bad_end");
        let mut config = test_config("synthetic", dir.clone());
        config.end = Some(12.0);
        let mut source = SyntheticSource::new(30.0, 300, 8, 6);

        let err = run_extraction(&mut source, &config, no_cancel()).unwrap_err();

        assert!(matches!(err, ExtractError::Config(ConfigError::EndBeyondDuration { .. })));
        assert!(source.decoded.is_empty());
        assert!(!dir.exists());
    }

    #[test]
    fn test_duplicates_are_not_written() {
        let dir = fresh_dir("framecut_test_extract_dupes");
        let mut config = test_config("synthetic", dir.clone());
        config.similarity = true;
        config.threshold = 50.0;
        let mut source = SyntheticSource::with_shade(30.0, 300, 8, 6, |_| 99);

        let report = run_extraction(&mut source, &config, no_cancel()).unwrap();

        assert_eq!(report.summary.saved, 1);
        assert_eq!(report.summary.skipped, 9);
        assert_eq!(file_utils::list_files(&dir, "png").unwrap().len(), 1);
    }

    #[test]
    fn test_unit_failures_are_counted_not_fatal() {
        let dir = fresh_dir("framecut_test_extract_failures");
        let mut config = test_config("synthetic", dir.clone());
        config.scale = 0.1;
        let mut source = SyntheticSource::new(30.0, 300, 8, 6);

        let report = run_extraction(&mut source, &config, no_cancel()).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.summary.saved, 10);
        assert_eq!(report.summary.failed, 10);
        assert!(report.written.is_empty());
        assert!(matches!(
            &report.failures[0],
            UnitError::Transform { sequence: 0, source: TransformError::EmptyOutput { .. } }
        ));
    }

    #[test]
    fn test_start_seek_failure_aborts_run() {
        let dir = fresh_dir("framecut_test_extract_seek");
        let mut config = test_config("synthetic", dir.clone());
        config.start = 2.0;
        let mut source = SyntheticSource::new(30.0, 300, 4, 4);
        source.fail_seek = true;

        let err = run_extraction(&mut source, &config, no_cancel()).unwrap_err();

        assert!(matches!(err, ExtractError::StartSeek { index: 60 }));
        assert!(source.decoded.is_empty());
        assert!(file_utils::list_files(&dir, "png").unwrap().is_empty());
    }

    #[test]
    fn test_report_json_shape() {
        let dir = fresh_dir("framecut_test_extract_json");
        let mut config = test_config("synthetic", dir);
        config.start = 8.0;
        let mut source = SyntheticSource::new(30.0, 300, 4, 4);

        let report = run_extraction(&mut source, &config, no_cancel()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["summary"]["saved"], 2);
        assert_eq!(value["plan"]["start_index"], 240);
        assert_eq!(value["written"].as_array().unwrap().len(), 2);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }
}
