use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::SimilarityFilter;
use crate::core::config::SamplingPlan;
use crate::core::worker_pool::{FrameSink, WorkUnit};
use crate::decoder::{FrameData, VideoSource};
use crate::utils::logger;

/// Counters owned by the scan thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Visited frames handed to the pool.
    pub processed: u64,
    /// Sequence numbers issued; always `0..saved`.
    pub saved: u64,
    /// Visited frames dropped as repeats of the last kept frame.
    pub skipped: u64,
    /// Units that failed to transform or write.
    pub failed: u64,
    pub cancelled: bool,
    /// The source refused the seek to the first planned frame.
    pub seek_failed: bool,
}

impl RunSummary {
    pub fn visited(&self) -> u64 {
        self.processed + self.skipped
    }
}

/// Issues 0, 1, 2, ... one per kept frame, at submission time.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: u64,
}

impl SequenceCounter {
    pub fn next(&mut self) -> u64 {
        let n = self.next;
        self.next += 1;
        n
    }

    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Walks the planned frame positions and feeds kept frames to a sink.
pub struct Sampler<'a, S: VideoSource + ?Sized> {
    source: &'a mut S,
    plan: SamplingPlan,
    filter: Option<SimilarityFilter>,
    cancel: Arc<AtomicBool>,
}

impl<'a, S: VideoSource + ?Sized> Sampler<'a, S> {
    pub fn new(source: &'a mut S, plan: SamplingPlan, filter: Option<SimilarityFilter>) -> Self {
        Self {
            source,
            plan,
            filter,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Checked before every read; setting it ends the scan after the current frame.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(&mut self, sink: &mut dyn FrameSink) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut sequence = SequenceCounter::default();
        // Private copy; the submitted frame belongs to the pool
        let mut last_kept: Option<FrameData> = None;

        let SamplingPlan { start_index, end_index, skip_frames, fps, .. } = self.plan;
        logger::info(&format!(
            "Scanning frames {}..{} every {} frame(s)",
            start_index, end_index, skip_frames
        ));

        if !self.source.seek_to_frame(start_index) {
            logger::error(&format!("Could not seek to start frame {}", start_index));
            summary.seek_failed = true;
            return summary;
        }

        let mut i = start_index;
        while i < end_index {
            if self.cancel.load(Ordering::SeqCst) {
                logger::info(&format!("Scan cancelled at frame {}", i));
                summary.cancelled = true;
                break;
            }

            let Some(mut frame) = self.source.read_next() else {
                logger::debug(&format!("End of stream at frame {}", i));
                break;
            };
            // Index by schedule, not by whatever the backend reports after a seek
            let current_time = i as f64 / fps;
            frame.index = i;
            frame.timestamp = Duration::try_from_secs_f64(current_time).unwrap_or_default();

            let repeat = self
                .filter
                .as_ref()
                .map_or(false, |f| f.should_skip(last_kept.as_ref(), &frame));

            if repeat {
                summary.skipped += 1;
                logger::debug(&format!("Frame {} ({:.3} s) skipped as repeat", i, current_time));
            } else {
                if self.filter.is_some() {
                    last_kept = Some(frame.clone());
                }
                // A number is only consumed once the pool has taken the unit
                let seq = sequence.issued();
                if sink.submit(WorkUnit { frame, sequence: seq }).is_err() {
                    logger::error("Worker pool closed; stopping scan");
                    break;
                }
                sequence.next();
                logger::debug(&format!("Frame {} ({:.3} s) kept as #{}", i, current_time, seq));
                summary.processed += 1;
                summary.saved += 1;
            }

            // read_next already moved one frame forward
            if !self.advance(skip_frames - 1) {
                break;
            }
            i += skip_frames;
        }

        debug_assert_eq!(sequence.issued(), summary.saved);
        summary
    }

    /// Grabs up to `frames` frames; false once the stream runs out.
    fn advance(&mut self, frames: u64) -> bool {
        for _ in 0..frames {
            if !self.source.grab() {
                return false;
            }
        }
        true
    }
}
