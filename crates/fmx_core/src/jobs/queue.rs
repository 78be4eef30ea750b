//! Batch job list with per-job status.

use serde::Serialize;

use crate::models::JobStatus;

use super::job::EncodeJob;

/// A job in the batch list.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub job: EncodeJob,
    pub status: JobStatus,
    /// Display name (file or folder name).
    pub name: String,
    /// Number of output videos.
    pub video_count: usize,
}

impl QueuedJob {
    pub fn new(job: EncodeJob) -> Self {
        Self {
            name: job.name(),
            video_count: job.video_count(),
            status: JobStatus::Waiting,
            job,
        }
    }

    /// Row shown in job listings.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            name: self.name.clone(),
            kind: self.job.kind(),
            status: self.status,
            video_count: self.video_count,
            frame_count: self.job.frame_count(),
            has_audio: self.job.has_audio(),
        }
    }
}

/// Serializable snapshot of a queued job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub name: String,
    pub kind: &'static str,
    pub status: JobStatus,
    pub video_count: usize,
    pub frame_count: u64,
    pub has_audio: bool,
}

/// Ordered list of jobs for one batch.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    jobs: Vec<QueuedJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all jobs.
    pub fn jobs(&self) -> &[QueuedJob] {
        &self.jobs
    }

    /// Get a job by index.
    pub fn get(&self, index: usize) -> Option<&QueuedJob> {
        self.jobs.get(index)
    }

    /// Get a mutable job by index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut QueuedJob> {
        self.jobs.get_mut(index)
    }

    /// Number of jobs in queue.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Add a job to the queue.
    pub fn add(&mut self, job: EncodeJob) {
        self.jobs.push(QueuedJob::new(job));
    }

    /// Add multiple jobs to the queue.
    pub fn add_all(&mut self, jobs: Vec<EncodeJob>) {
        self.jobs.extend(jobs.into_iter().map(QueuedJob::new));
    }

    /// Remove a job by index.
    pub fn remove(&mut self, index: usize) -> Option<QueuedJob> {
        if index < self.jobs.len() {
            Some(self.jobs.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Drop jobs that finished successfully, keeping failures for a retry.
    pub fn clear_successful(&mut self) {
        self.jobs.retain(|j| j.status != JobStatus::Success);
    }

    /// Put every job back to waiting.
    pub fn reset_statuses(&mut self) {
        for job in &mut self.jobs {
            job.status = JobStatus::Waiting;
        }
    }

    /// Sum of all jobs' workloads.
    pub fn total_frames(&self) -> u64 {
        self.jobs.iter().map(|j| j.job.frame_count()).sum()
    }

    pub fn summaries(&self) -> Vec<JobSummary> {
        self.jobs.iter().map(QueuedJob::summary).collect()
    }
}
