//! Execution plans and per-job progress accounting.
//!
//! Every job variant describes its work as a [`JobPlan`]: an ordered list of
//! encoder invocations plus file operations around them. Running and
//! exporting a job both walk the same plan, so the script always matches what
//! a run would do.

use std::path::PathBuf;

use crate::encoder::EncodeParams;

/// Name of the intermediate file written by the first pass of a two-pass job.
pub const TEMP_FILE_NAME: &str = "temp.avi";

/// One encoder invocation within a job.
#[derive(Debug, Clone, PartialEq)]
pub struct SubJob {
    pub params: EncodeParams,
    /// Workload of each input, in input order. The encoder's percentage
    /// restarts for each input of a multi-file run.
    pub segments: Vec<u64>,
}

impl SubJob {
    pub fn new(params: EncodeParams, segments: Vec<u64>) -> Self {
        Self { params, segments }
    }

    pub fn workload(&self) -> u64 {
        self.segments.iter().sum()
    }
}

/// A file rename performed before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// One step of a job plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    /// Normalize file names before an encode.
    Rename(Vec<FileRename>),
    /// Launch the encoder once.
    Encode(SubJob),
    /// Delete an intermediate file if it exists.
    RemoveFile(PathBuf),
}

/// Ordered steps for one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPlan {
    pub steps: Vec<PlanStep>,
}

impl JobPlan {
    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Encoder invocations in order.
    pub fn sub_jobs(&self) -> impl Iterator<Item = &SubJob> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Encode(sub) => Some(sub),
            _ => None,
        })
    }

    /// Number of encoder launches.
    pub fn encode_count(&self) -> usize {
        self.sub_jobs().count()
    }

    /// Sum of all sub-job workloads (two-pass jobs count their frames twice).
    pub fn total_workload(&self) -> u64 {
        self.sub_jobs().map(SubJob::workload).sum()
    }
}

/// Progress reported by a running job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobEvent {
    /// Fraction of the whole job done, in `[0, 1]`.
    Progress(f64),
    FrameRate(f64),
    FrameIndex(u64),
}

/// Maps encoder percentages to a fraction of the whole job.
///
/// A percentage lower than the previous sample means the encoder moved on to
/// the next input of a multi-file sub-job: the finished input's workload is
/// banked and the next segment becomes current. When the process exits the
/// whole sub-job counts as done, whatever samples were seen.
#[derive(Debug, Clone, Default)]
pub struct JobProgress {
    total: u64,
    processed: u64,
    sub_job_start: u64,
    sub_job_workload: u64,
    current: u64,
    segments: Vec<u64>,
    segment_index: usize,
    previous_percent: u32,
}

impl JobProgress {
    pub fn new(total_workload: u64) -> Self {
        Self {
            total: total_workload,
            ..Self::default()
        }
    }

    /// Start accounting for `sub_job`.
    pub fn begin(&mut self, sub_job: &SubJob) {
        self.segments = sub_job.segments.clone();
        self.sub_job_start = self.processed;
        self.sub_job_workload = sub_job.workload();
        self.segment_index = 0;
        self.previous_percent = 0;
        self.current = self.segments.first().copied().unwrap_or(0);
    }

    /// Feed one percentage sample; returns the job fraction done.
    pub fn on_percent(&mut self, percent: u32) -> f64 {
        if percent < self.previous_percent {
            self.segment_index += 1;
            if let Some(&next) = self.segments.get(self.segment_index) {
                self.processed += self.current;
                self.current = next;
            }
        }
        self.previous_percent = percent;

        let done = self.processed as f64 + self.current as f64 * f64::from(percent) / 100.0;
        self.fraction_of(done)
    }

    /// Bank the sub-job once its process has exited.
    pub fn end(&mut self) {
        self.processed = self.sub_job_start + self.sub_job_workload;
        self.current = 0;
    }

    /// Fraction of the job done so far, counting finished segments only.
    pub fn fraction(&self) -> f64 {
        self.fraction_of(self.processed as f64)
    }

    fn fraction_of(&self, done: f64) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (done / self.total as f64).clamp(0.0, 1.0)
    }
}
