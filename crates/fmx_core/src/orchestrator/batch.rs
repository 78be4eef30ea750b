//! Sequential batch runner.
//!
//! One worker runs the jobs of a [`JobQueue`] in order, one encoder process at
//! a time. Overall progress is weighted by each job's frame count:
//!
//! ```text
//! overall = 100 * (processed + current * job_fraction) / total
//! ```
//!
//! Cancellation is checked between jobs only; the job being encoded always
//! runs to the end.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::Settings;
use crate::encoder::EncodeExecutor;
use crate::jobs::{JobEvent, JobQueue};
use crate::logging::BatchLog;
use crate::models::JobStatus;

use super::cancel::CancelHandle;
use super::context::BatchRunContext;
use super::errors::{BatchError, BatchResult};
use super::sink::ProgressSink;
use super::state::BatchState;

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs left waiting because the batch was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Runs every job of a queue through an executor.
pub struct BatchOrchestrator {
    settings: Settings,
    log: Arc<BatchLog>,
    sink: Arc<dyn ProgressSink>,
    cancel: CancelHandle,
    run_ctx: BatchRunContext,
    state: BatchState,
}

impl BatchOrchestrator {
    /// Create an orchestrator over a settings snapshot.
    pub fn new(settings: Settings, log: Arc<BatchLog>, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            cancel: CancelHandle::with_log(Arc::clone(&log)),
            settings,
            log,
            sink,
            run_ctx: BatchRunContext::new(),
            state: BatchState::default(),
        }
    }

    /// Get a handle that can cancel this orchestrator's batches.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Workload accounting of the last (or current) run.
    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run every job in `queue`, in order.
    ///
    /// A job whose encoder cannot be started is marked failed and the batch
    /// moves on. After a cancel request no further job starts; those jobs
    /// keep their waiting status.
    pub fn run(&mut self, queue: &mut JobQueue, executor: &mut dyn EncodeExecutor) -> BatchSummary {
        self.run_ctx.reset();
        self.cancel.reset();
        self.state = BatchState::new(queue.total_frames());

        let job_count = queue.len();
        let mut summary = BatchSummary::default();

        tracing::info!(
            "Starting batch: {} job(s), {} frame(s)",
            job_count,
            self.state.total_workload_frames
        );
        self.sink.set_overall_progress(0.0);

        for index in 0..job_count {
            if self.cancel.is_cancelled() {
                self.state.cancel_requested = true;
                summary.cancelled = true;
                summary.skipped = job_count - index;
                tracing::info!("Batch cancelled before job {}/{}", index + 1, job_count);
                break;
            }

            let Some(entry) = queue.get_mut(index) else {
                break;
            };

            tracing::info!("Processing job {}/{}: {}", index + 1, job_count, entry.name);
            entry.status = JobStatus::Encoding;
            self.sink.set_job_started(index, &entry.name);
            self.sink.set_job_status(index, JobStatus::Encoding);
            self.state.begin_job(entry.job.frame_count());

            let state = self.state;
            let sink = Arc::clone(&self.sink);
            let mut on_event = |event: JobEvent| match event {
                JobEvent::Progress(fraction) => {
                    sink.set_overall_progress(state.overall_percent(fraction))
                }
                JobEvent::FrameRate(fps) => sink.set_current_frame_rate(fps),
                JobEvent::FrameIndex(frame) => sink.set_current_frame_index(frame),
            };

            let result = entry.job.execute(
                &self.settings,
                &mut self.run_ctx,
                &self.log,
                executor,
                &mut on_event,
            );

            entry.status = match result {
                Ok(()) => {
                    summary.succeeded += 1;
                    JobStatus::Success
                }
                Err(e) => {
                    let error = BatchError::job_failed(entry.name.clone(), e);
                    tracing::error!("{}", error);
                    self.log.error(&error.to_string());
                    summary.failed += 1;
                    JobStatus::Failure
                }
            };
            self.sink.set_job_status(index, entry.status);

            self.state.finish_job();
            self.sink.set_overall_progress(self.state.overall_percent(0.0));
        }

        self.log.info(&format!(
            "Batch finished: {} succeeded, {} failed, {} skipped",
            summary.succeeded, summary.failed, summary.skipped
        ));
        self.log.flush();
        summary
    }
}

/// A batch running on its own worker thread.
pub struct BatchHandle {
    cancel: CancelHandle,
    handle: JoinHandle<(JobQueue, BatchSummary)>,
}

impl BatchHandle {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Request cancellation after the current job.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the batch and get the queue back with final statuses.
    ///
    /// A panic on the worker thread is returned as
    /// [`BatchError::WorkerPanicked`].
    pub fn join(self) -> BatchResult<(JobQueue, BatchSummary)> {
        self.handle.join().map_err(|payload| {
            let error = BatchError::worker_panicked(payload.as_ref());
            tracing::error!("{}", error);
            error
        })
    }
}

/// Run `queue` on a new worker thread.
pub fn spawn_batch(
    mut orchestrator: BatchOrchestrator,
    mut queue: JobQueue,
    mut executor: Box<dyn EncodeExecutor + Send>,
) -> io::Result<BatchHandle> {
    let cancel = orchestrator.cancel_handle();
    let handle = thread::Builder::new()
        .name("batch-worker".to_string())
        .spawn(move || {
            let summary = orchestrator.run(&mut queue, executor.as_mut());
            (queue, summary)
        })?;
    Ok(BatchHandle { cancel, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avi::test_support::write_avi;
    use crate::encoder::{EncodeError, EncodeResult, EncoderEvent, EncoderInvocation, RunReport};
    use crate::jobs::{EncodeJob, SingleAviJob};
    use crate::logging::LogConfig;
    use parking_lot::Mutex;
    use std::sync::mpsc;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq)]
    enum SinkEvent {
        Overall(f64),
        Started(usize),
        Status(usize, JobStatus),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<SinkEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn set_overall_progress(&self, percent: f64) {
            self.events.lock().push(SinkEvent::Overall(percent));
        }
        fn set_current_frame_rate(&self, _fps: f64) {}
        fn set_current_frame_index(&self, _index: u64) {}
        fn set_job_started(&self, index: usize, _name: &str) {
            self.events.lock().push(SinkEvent::Started(index));
        }
        fn set_job_status(&self, index: usize, status: JobStatus) {
            self.events.lock().push(SinkEvent::Status(index, status));
        }
    }

    /// Succeeds instantly, optionally failing or hooking selected runs.
    struct FakeExecutor {
        runs: usize,
        fail_on: Option<usize>,
        on_run: Box<dyn FnMut(usize) + Send>,
    }

    impl FakeExecutor {
        fn new() -> Self {
            Self {
                runs: 0,
                fail_on: None,
                on_run: Box::new(|_| {}),
            }
        }
    }

    impl EncodeExecutor for FakeExecutor {
        fn run(
            &mut self,
            _invocation: &EncoderInvocation,
            events: &mut dyn FnMut(EncoderEvent),
        ) -> EncodeResult<RunReport> {
            self.runs += 1;
            (self.on_run)(self.runs);
            if self.fail_on == Some(self.runs) {
                return Err(EncodeError::MissingPipe("stdout"));
            }
            events(EncoderEvent::Progress(50));
            Ok(RunReport {
                exit_code: Some(0),
                stderr_output: String::new(),
            })
        }
    }

    fn quiet_log() -> Arc<BatchLog> {
        Arc::new(BatchLog::new(
            LogConfig {
                show_timestamps: false,
                ..LogConfig::default()
            },
            None,
        ))
    }

    fn queue_of(dir: &std::path::Path, frames: &[u32]) -> JobQueue {
        let mut queue = JobQueue::new();
        for (i, &count) in frames.iter().enumerate() {
            let path = dir.join(format!("clip{}.avi", i));
            write_avi(&path, count, 1, 0);
            queue.add(EncodeJob::SingleAvi(SingleAviJob::analyze(&path).unwrap()));
        }
        queue
    }

    fn statuses(queue: &JobQueue) -> Vec<JobStatus> {
        queue.jobs().iter().map(|j| j.status).collect()
    }

    #[test]
    fn overall_progress_is_weighted_by_frames() {
        let dir = tempdir().unwrap();
        let mut queue = queue_of(dir.path(), &[100, 50, 150]);
        let sink = Arc::new(RecordingSink::default());
        let mut orchestrator =
            BatchOrchestrator::new(Settings::default(), quiet_log(), sink.clone());

        let summary = orchestrator.run(&mut queue, &mut FakeExecutor::new());

        assert_eq!(summary.succeeded, 3);
        assert_eq!(statuses(&queue), vec![JobStatus::Success; 3]);

        let events = sink.events.lock().clone();
        let third_start = events
            .iter()
            .position(|e| *e == SinkEvent::Started(2))
            .unwrap();
        let before_third = events[..third_start]
            .iter()
            .rev()
            .find_map(|e| match e {
                SinkEvent::Overall(p) => Some(*p),
                _ => None,
            })
            .unwrap();
        assert_eq!(before_third, 50.0);
        assert_eq!(events.last(), Some(&SinkEvent::Overall(100.0)));
    }

    #[test]
    fn sub_progress_stays_inside_the_job_share() {
        let dir = tempdir().unwrap();
        let mut queue = queue_of(dir.path(), &[100, 100]);
        let sink = Arc::new(RecordingSink::default());
        let mut orchestrator =
            BatchOrchestrator::new(Settings::default(), quiet_log(), sink.clone());

        orchestrator.run(&mut queue, &mut FakeExecutor::new());

        // The executor reports 50% once per job.
        let overall: Vec<f64> = sink
            .events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Overall(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(overall, vec![0.0, 25.0, 50.0, 50.0, 75.0, 100.0, 100.0]);
    }

    #[test]
    fn launch_failure_marks_job_and_continues() {
        let dir = tempdir().unwrap();
        let mut queue = queue_of(dir.path(), &[10, 20]);
        let log = quiet_log();
        let mut orchestrator = BatchOrchestrator::new(
            Settings::default(),
            Arc::clone(&log),
            Arc::new(RecordingSink::default()),
        );
        let mut executor = FakeExecutor::new();
        executor.fail_on = Some(1);

        let summary = orchestrator.run(&mut queue, &mut executor);

        assert_eq!(statuses(&queue), vec![JobStatus::Failure, JobStatus::Success]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(orchestrator.state().processed_workload_frames, 30);
        assert!(log
            .get_tail()
            .iter()
            .any(|line| line.starts_with("[ERROR] Job 'clip0.avi' failed")));
    }

    #[test]
    fn cancel_during_second_job_skips_the_third() {
        let dir = tempdir().unwrap();
        let mut queue = queue_of(dir.path(), &[100, 50, 150]);
        let mut orchestrator = BatchOrchestrator::new(
            Settings::default(),
            quiet_log(),
            Arc::new(RecordingSink::default()),
        );
        let cancel = orchestrator.cancel_handle();

        let mut executor = FakeExecutor::new();
        executor.on_run = Box::new(move |run| {
            if run == 2 {
                cancel.cancel();
            }
        });

        let summary = orchestrator.run(&mut queue, &mut executor);

        assert_eq!(
            statuses(&queue),
            vec![JobStatus::Success, JobStatus::Success, JobStatus::Waiting]
        );
        assert_eq!(summary.skipped, 1);
        assert!(summary.cancelled);
        assert!(orchestrator.state().cancel_requested);
        assert_eq!(executor.runs, 2);
    }

    #[test]
    fn worker_thread_cancel_waits_for_current_job() {
        let dir = tempdir().unwrap();
        let queue = queue_of(dir.path(), &[100, 50, 150]);
        let log = quiet_log();
        let orchestrator = BatchOrchestrator::new(
            Settings::default(),
            Arc::clone(&log),
            Arc::new(RecordingSink::default()),
        );

        let (started_tx, started_rx) = mpsc::channel();
        let (go_tx, go_rx) = mpsc::channel::<()>();
        let mut executor = FakeExecutor::new();
        executor.on_run = Box::new(move |run| {
            if run == 2 {
                started_tx.send(()).unwrap();
                go_rx.recv().unwrap();
            }
        });

        let handle = spawn_batch(orchestrator, queue, Box::new(executor)).unwrap();
        started_rx.recv().unwrap();
        handle.cancel();
        handle.cancel();
        go_tx.send(()).unwrap();

        let (queue, summary) = handle.join().unwrap();
        assert_eq!(
            statuses(&queue),
            vec![JobStatus::Success, JobStatus::Success, JobStatus::Waiting]
        );
        assert_eq!(summary.skipped, 1);

        let cancel_lines = log
            .get_tail()
            .iter()
            .filter(|line| line.starts_with("Batch canceled!"))
            .count();
        assert_eq!(cancel_lines, 1);
    }

    #[test]
    fn worker_panic_is_reported() {
        let dir = tempdir().unwrap();
        let queue = queue_of(dir.path(), &[10]);
        let orchestrator = BatchOrchestrator::new(
            Settings::default(),
            quiet_log(),
            Arc::new(RecordingSink::default()),
        );
        let mut executor = FakeExecutor::new();
        executor.on_run = Box::new(|_| panic!("encoder double exploded"));

        let handle = spawn_batch(orchestrator, queue, Box::new(executor)).unwrap();
        match handle.join() {
            Err(BatchError::WorkerPanicked(message)) => {
                assert_eq!(message, "encoder double exploded")
            }
            _ => panic!("expected a worker panic"),
        }
    }
}
