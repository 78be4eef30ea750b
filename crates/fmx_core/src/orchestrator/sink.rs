//! Progress notifications for the display layer.

use crate::models::JobStatus;

/// Receiver of batch progress. Every method is fire-and-forget and is called
/// from the batch worker thread.
pub trait ProgressSink: Send + Sync {
    /// Overall batch progress in percent, `[0, 100]`.
    fn set_overall_progress(&self, percent: f64);

    /// Encoding speed reported by the running encoder.
    fn set_current_frame_rate(&self, fps: f64);

    /// Frame the running encoder is at.
    fn set_current_frame_index(&self, index: u64);

    /// A job at `index` in the queue started.
    fn set_job_started(&self, index: usize, name: &str);

    /// A job's status changed.
    fn set_job_status(&self, index: usize, status: JobStatus);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn set_overall_progress(&self, _percent: f64) {}
    fn set_current_frame_rate(&self, _fps: f64) {}
    fn set_current_frame_index(&self, _index: u64) {}
    fn set_job_started(&self, _index: usize, _name: &str) {}
    fn set_job_status(&self, _index: usize, _status: JobStatus) {}
}
