use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::core::error::UnitError;
use crate::decoder::FrameData;
use crate::utils::logger;

/// One kept frame and the sequence number it will be written under.
#[derive(Debug)]
pub struct WorkUnit {
    pub frame: FrameData,
    pub sequence: u64,
}

#[derive(Debug)]
pub struct UnitOutcome {
    pub sequence: u64,
    pub result: Result<PathBuf, UnitError>,
}

#[derive(Debug, Error, PartialEq)]
#[error("worker pool is no longer accepting frames")]
pub struct PoolClosed;

/// Where the sampler hands kept frames.
pub trait FrameSink {
    fn submit(&mut self, unit: WorkUnit) -> Result<(), PoolClosed>;
}

/// Outcome of every submitted unit, ordered by sequence number.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub written: Vec<(u64, PathBuf)>,
    pub failures: Vec<UnitError>,
}

/// Fixed set of threads fed through a bounded channel.
///
/// `submit` blocks once `queue_depth` units are waiting, which throttles
/// decoding to the speed of encode + write.
pub struct WorkerPool {
    sender: Option<Sender<WorkUnit>>,
    results: Receiver<UnitOutcome>,
    handles: Vec<JoinHandle<()>>,
    submitted: Vec<u64>,
}

impl WorkerPool {
    pub fn new<F>(workers: usize, queue_depth: usize, job: F) -> std::io::Result<Self>
    where
        F: Fn(WorkUnit) -> Result<PathBuf, UnitError> + Send + Sync + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded::<WorkUnit>(queue_depth.max(1));
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<UnitOutcome>();
        let job = Arc::new(job);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers.max(1) {
            let rx = rx.clone();
            let result_tx = result_tx.clone();
            let job = Arc::clone(&job);
            let handle = thread::Builder::new()
                .name(format!("framecut-worker-{}", id))
                .spawn(move || {
                    while let Ok(unit) = rx.recv() {
                        let sequence = unit.sequence;
                        let result = job(unit);
                        if let Err(e) = &result {
                            logger::error(&e.to_string());
                        }
                        if result_tx.send(UnitOutcome { sequence, result }).is_err() {
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }

        logger::debug(&format!(
            "Worker pool started: {} workers, queue depth {}",
            handles.len(),
            queue_depth.max(1)
        ));

        Ok(Self {
            sender: Some(tx),
            results: result_rx,
            handles,
            submitted: Vec::new(),
        })
    }

    pub fn submitted(&self) -> usize {
        self.submitted.len()
    }

    /// Stops intake, waits for every worker to finish, and collects outcomes.
    ///
    /// A unit whose worker died without reporting comes back as `UnitError::Lost`.
    pub fn drain(mut self) -> DrainReport {
        drop(self.sender.take());

        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_string();
            if handle.join().is_err() {
                logger::error(&format!("{} panicked; its unit is lost", name));
            }
        }

        let mut outcomes: BTreeMap<u64, Result<PathBuf, UnitError>> = self
            .results
            .try_iter()
            .map(|o| (o.sequence, o.result))
            .collect();

        let mut report = DrainReport::default();
        for sequence in self.submitted.drain(..) {
            match outcomes.remove(&sequence) {
                Some(Ok(path)) => report.written.push((sequence, path)),
                Some(Err(e)) => report.failures.push(e),
                None => report.failures.push(UnitError::Lost { sequence }),
            }
        }
        report.written.sort_by_key(|(sequence, _)| *sequence);
        report.failures.sort_by_key(|e| e.sequence());
        report
    }
}

impl FrameSink for WorkerPool {
    fn submit(&mut self, unit: WorkUnit) -> Result<(), PoolClosed> {
        let sender = self.sender.as_ref().ok_or(PoolClosed)?;
        let sequence = unit.sequence;
        // Only fails once every worker has exited
        sender.send(unit).map_err(|_| PoolClosed)?;
        self.submitted.push(sequence);
        Ok(())
    }
}
