//! Job discovery from dropped paths.
//!
//! Files become single-AVI jobs. Each folder is tried as a captured-cut
//! layout, then as an image-sequence folder; folders rejected by both are
//! retried as AVI folders after all other folders. Inputs that fit nothing
//! are reported to the batch log and skipped.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::logging::BatchLog;

use super::avi_file::SingleAviJob;
use super::avi_folder::AviFolderJob;
use super::captured_cut::{has_cut_folders, CapturedCutJob};
use super::errors::AnalyzeResult;
use super::image_sequence::ImageSequenceJob;
use super::job::EncodeJob;
use super::scan::has_extension;

/// Analyze `paths` and return the valid jobs: files first, then image and
/// cut folders, then AVI folders, each group in input order.
pub fn discover_jobs(paths: &[PathBuf], settings: &Settings, log: &BatchLog) -> Vec<EncodeJob> {
    let (folders, files): (Vec<&PathBuf>, Vec<&PathBuf>) =
        paths.iter().partition(|path| path.is_dir());

    let mut jobs = Vec::new();

    for file in files {
        match analyze_file(file) {
            Some(job) => jobs.push(job),
            None => log.warn(&format!("Invalid file: {}", file.display())),
        }
    }

    let mut rejected = Vec::new();
    for folder in folders {
        match analyze_image_folder(folder, settings) {
            Some(job) => jobs.push(job),
            None => rejected.push(folder),
        }
    }

    for folder in rejected {
        match keep_valid(AviFolderJob::analyze(folder).map(EncodeJob::AviFolder), folder) {
            Some(job) => jobs.push(job),
            None => log.warn(&format!("Invalid folder: {}", folder.display())),
        }
    }

    tracing::info!("Discovered {} job(s) from {} path(s)", jobs.len(), paths.len());
    jobs
}

fn analyze_file(path: &Path) -> Option<EncodeJob> {
    if !has_extension(path, "avi") {
        return None;
    }
    keep_valid(SingleAviJob::analyze(path).map(EncodeJob::SingleAvi), path)
}

fn analyze_image_folder(folder: &Path, settings: &Settings) -> Option<EncodeJob> {
    if has_cut_folders(folder) {
        let cut = keep_valid(CapturedCutJob::analyze(folder).map(EncodeJob::CapturedCut), folder);
        if cut.is_some() {
            return cut;
        }
    }

    keep_valid(
        ImageSequenceJob::analyze(folder, settings.output.sequence_naming)
            .map(EncodeJob::ImageSequence),
        folder,
    )
}

fn keep_valid(analyzed: AnalyzeResult<EncodeJob>, path: &Path) -> Option<EncodeJob> {
    match analyzed {
        Ok(job) if job.is_valid() => Some(job),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Analysis of {} failed: {}", path.display(), e);
            None
        }
    }
}
