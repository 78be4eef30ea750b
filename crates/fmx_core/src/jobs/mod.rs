//! Encode jobs and the batch job list.
//!
//! This module provides:
//! - `EncodeJob`: the four capture layouts (single AVI, AVI folder, image
//!   sequence folder, captured cut) behind one sum type
//! - `JobPlan`: the encoder invocations and file operations a job performs,
//!   shared by execution and script export
//! - `discover_jobs`: turns dropped files and folders into valid jobs
//! - `JobQueue`: the ordered batch list with per-job status

mod avi_file;
mod avi_folder;
mod captured_cut;
mod discovery;
mod errors;
mod image_sequence;
mod job;
mod plan;
mod queue;
mod scan;

pub use avi_file::SingleAviJob;
pub use avi_folder::AviFolderJob;
pub use captured_cut::{cut_frame_rate, CapturedCutJob, Cut, CutChannel};
pub use discovery::discover_jobs;
pub use errors::{AnalyzeError, AnalyzeResult};
pub use image_sequence::ImageSequenceJob;
pub use job::EncodeJob;
pub use plan::{FileRename, JobEvent, JobPlan, JobProgress, PlanStep, SubJob, TEMP_FILE_NAME};
pub use queue::{JobQueue, JobSummary, QueuedJob};
pub use scan::{AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};
