//! Single-worker asynchronous execution of colorization jobs.
//!
//! One background thread owns the job queue. Submissions are enqueued in
//! arrival order, run one at a time, and are never cancelled or preempted.
//! Outcomes travel back over a channel; the receiving side applies them
//! only in monotonically increasing submission order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Error, Result};
use crate::model::Predict;
use crate::pipeline::{ColorizationJob, ColorizationResult};

/// Identifies one submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    seq: u64,
    path: PathBuf,
}

impl JobHandle {
    /// Submission sequence number, strictly increasing from 1.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Source path this job was submitted for.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One completed job, success or failure, as handed back by the worker.
///
/// Failures take the same route and the same ordering discipline as
/// successes.
#[derive(Debug)]
pub struct Delivery {
    /// Handle issued at submission.
    pub handle: JobHandle,
    /// Terminal outcome of the job.
    pub outcome: Result<ColorizationResult>,
}

/// Submission side of the runner.
///
/// Dropping it closes the queue and joins the worker; already-queued jobs
/// run to completion first.
pub struct TaskRunner {
    jobs: Option<mpsc::Sender<JobHandle>>,
    next_seq: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl TaskRunner {
    /// Spawn the worker thread and connect the delivery channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn spawn(predictor: Arc<dyn Predict>) -> Result<(Self, Deliveries)> {
        let (jobs_tx, jobs_rx) = mpsc::channel();
        let (results_tx, results_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("colorize-worker".to_string())
            .spawn(move || worker_loop(&jobs_rx, &results_tx, predictor))?;

        Ok((
            Self {
                jobs: Some(jobs_tx),
                next_seq: AtomicU64::new(0),
                worker: Some(worker),
            },
            Deliveries {
                results: results_rx,
                last_applied: 0,
            },
        ))
    }

    /// Queue one job and return immediately.
    ///
    /// Jobs execute one at a time in arrival order; submitting while a job
    /// is running queues behind it and never preempts it.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has shut down.
    pub fn submit<P: Into<PathBuf>>(&self, path: P) -> Result<JobHandle> {
        let handle = JobHandle {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
            path: path.into(),
        };

        let jobs = self.jobs.as_ref().ok_or(Error::WorkerStopped)?;
        jobs.send(handle.clone()).map_err(|_| Error::WorkerStopped)?;

        tracing::debug!("Queued job #{} for {}", handle.seq(), handle.path().display());
        Ok(handle)
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain it and exit
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Colorization worker panicked");
            }
        }
    }
}

fn worker_loop(
    jobs: &mpsc::Receiver<JobHandle>,
    results: &mpsc::Sender<Delivery>,
    predictor: Arc<dyn Predict>,
) {
    let job = ColorizationJob::new(predictor);

    while let Ok(handle) = jobs.recv() {
        tracing::info!("Job #{} started: {}", handle.seq(), handle.path().display());
        let outcome = job.run(handle.path());
        if let Err(err) = &outcome {
            tracing::warn!("Job #{} failed: {err}", handle.seq());
        }

        // Nobody listening for results means shutdown
        if results.send(Delivery { handle, outcome }).is_err() {
            break;
        }
    }
}

/// Receiving side of the runner, owned by the interactive thread.
///
/// Every delivery passes the ordering guard: an outcome is applied only if
/// its sequence number exceeds the last applied one, so a slow older job
/// can never overwrite a newer job's visible result. Stale deliveries are
/// discarded silently.
pub struct Deliveries {
    results: mpsc::Receiver<Delivery>,
    last_applied: u64,
}

impl Deliveries {
    /// Block until the next applicable delivery.
    ///
    /// Returns `None` once the worker side has shut down.
    pub fn wait(&mut self) -> Option<Delivery> {
        loop {
            let delivery = self.results.recv().ok()?;
            if self.apply(&delivery) {
                return Some(delivery);
            }
        }
    }

    /// Non-blocking variant of [`Deliveries::wait`].
    ///
    /// Returns `None` when no applicable delivery is ready right now.
    pub fn poll(&mut self) -> Option<Delivery> {
        loop {
            let delivery = self.results.try_recv().ok()?;
            if self.apply(&delivery) {
                return Some(delivery);
            }
        }
    }

    /// Sequence number of the most recently applied delivery.
    #[must_use]
    pub const fn last_applied_seq(&self) -> u64 {
        self.last_applied
    }

    fn apply(&mut self, delivery: &Delivery) -> bool {
        if delivery.handle.seq() > self.last_applied {
            self.last_applied = delivery.handle.seq();
            true
        } else {
            tracing::debug!(
                "Discarding stale result #{} (last applied #{})",
                delivery.handle.seq(),
                self.last_applied
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::image::{ColorSpace, RasterImage};
    use crate::model::{LightnessPlane, PredictedChannels, INPUT_SIZE};

    /// Predictor that sleeps for a scripted duration on each call.
    struct DelayedPredictor {
        delays: Mutex<VecDeque<Duration>>,
    }

    impl DelayedPredictor {
        fn new<I: IntoIterator<Item = u64>>(millis: I) -> Self {
            Self {
                delays: Mutex::new(millis.into_iter().map(Duration::from_millis).collect()),
            }
        }
    }

    impl Predict for DelayedPredictor {
        fn predict(&self, _plane: &LightnessPlane) -> Result<PredictedChannels> {
            let delay = self.delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            let n = INPUT_SIZE as usize * INPUT_SIZE as usize;
            PredictedChannels::new(vec![0.0; n], vec![0.0; n], INPUT_SIZE, INPUT_SIZE)
        }
    }

    fn fixture(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let image =
            RasterImage::from_samples(20, 16, ColorSpace::Gray, vec![90.0; 320]).unwrap();
        crate::image::save_image(&image, &path, 95).unwrap();
        path
    }

    #[test]
    fn test_slow_then_fast_applies_the_newest_result() {
        let dir = tempfile::tempdir().unwrap();
        let slow = fixture(dir.path(), "slow.jpg");
        let fast = fixture(dir.path(), "fast.jpg");

        let predictor = Arc::new(DelayedPredictor::new([200, 0]));
        let (runner, mut deliveries) = TaskRunner::spawn(predictor).unwrap();

        let first = runner.submit(&slow).unwrap();
        let second = runner.submit(&fast).unwrap();
        assert_eq!(first.seq(), 1);
        assert_eq!(second.seq(), 2);

        let a = deliveries.wait().unwrap();
        let b = deliveries.wait().unwrap();

        assert_eq!(a.handle, first);
        assert_eq!(b.handle, second);
        assert!(b.outcome.is_ok());
        assert_eq!(deliveries.last_applied_seq(), second.seq());
    }

    #[test]
    fn test_failures_are_delivered_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let good = fixture(dir.path(), "good.jpg");
        let missing = dir.path().join("missing.jpg");

        let predictor = Arc::new(DelayedPredictor::new([]));
        let (runner, mut deliveries) = TaskRunner::spawn(predictor).unwrap();

        runner.submit(&missing).unwrap();
        runner.submit(&good).unwrap();

        let failed = deliveries.wait().unwrap();
        assert_eq!(failed.handle.seq(), 1);
        assert!(matches!(failed.outcome, Err(Error::Decode { .. })));

        let succeeded = deliveries.wait().unwrap();
        assert_eq!(succeeded.handle.seq(), 2);
        assert!(succeeded.outcome.is_ok());
    }

    #[test]
    fn test_stale_deliveries_are_discarded() {
        let (tx, rx) = mpsc::channel();
        let mut deliveries = Deliveries {
            results: rx,
            last_applied: 0,
        };

        let send = |seq: u64| {
            tx.send(Delivery {
                handle: JobHandle {
                    seq,
                    path: PathBuf::from("x.jpg"),
                },
                outcome: Err(Error::WorkerStopped),
            })
            .unwrap();
        };
        send(2);
        send(1);
        drop(tx);

        assert_eq!(deliveries.wait().unwrap().handle.seq(), 2);
        // The out-of-order older result is skipped, then the channel ends
        assert!(deliveries.wait().is_none());
        assert_eq!(deliveries.last_applied_seq(), 2);
    }

    #[test]
    fn test_queued_jobs_survive_runner_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), "queued.jpg");

        let predictor = Arc::new(DelayedPredictor::new([50]));
        let (runner, mut deliveries) = TaskRunner::spawn(predictor).unwrap();

        runner.submit(&path).unwrap();
        drop(runner);

        let delivery = deliveries.wait().unwrap();
        assert_eq!(delivery.handle.seq(), 1);
        assert!(delivery.outcome.is_ok());
        assert!(deliveries.wait().is_none());
    }

    #[test]
    fn test_wait_ends_after_shutdown() {
        let predictor = Arc::new(DelayedPredictor::new([]));
        let (runner, mut deliveries) = TaskRunner::spawn(predictor).unwrap();

        drop(runner);
        assert!(deliveries.wait().is_none());
        assert!(deliveries.poll().is_none());
    }
}
