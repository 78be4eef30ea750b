//! Workload accounting for one batch.

/// Frame counts used to weight overall progress.
///
/// Written only by the worker thread; readers on other threads get snapshot
/// copies, which is good enough for a progress bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchState {
    /// Sum of every queued job's frame count.
    pub total_workload_frames: u64,
    /// Frames of jobs that already finished.
    pub processed_workload_frames: u64,
    /// Frame count of the job being encoded.
    pub current_job_workload_frames: u64,
    pub cancel_requested: bool,
}

impl BatchState {
    pub fn new(total_workload_frames: u64) -> Self {
        Self {
            total_workload_frames,
            ..Self::default()
        }
    }

    /// Start accounting for a job of `frames` workload.
    pub fn begin_job(&mut self, frames: u64) {
        self.current_job_workload_frames = frames;
    }

    /// Bank the current job.
    pub fn finish_job(&mut self) {
        self.processed_workload_frames += self.current_job_workload_frames;
        self.current_job_workload_frames = 0;
    }

    /// Overall percent with the current job `job_fraction` done (`[0, 1]`).
    pub fn overall_percent(&self, job_fraction: f64) -> f64 {
        if self.total_workload_frames == 0 {
            return 0.0;
        }
        let done = self.processed_workload_frames as f64
            + self.current_job_workload_frames as f64 * job_fraction.clamp(0.0, 1.0);
        (100.0 * done / self.total_workload_frames as f64).clamp(0.0, 100.0)
    }
}
