//! The encode job sum type and plan execution.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::config::Settings;
use crate::encoder::{
    build_invocation, BatchScript, EncodeError, EncodeExecutor, EncodeResult, EncoderEvent,
};
use crate::logging::BatchLog;
use crate::orchestrator::BatchRunContext;

use super::avi_file::SingleAviJob;
use super::avi_folder::AviFolderJob;
use super::captured_cut::CapturedCutJob;
use super::image_sequence::ImageSequenceJob;
use super::plan::{FileRename, JobEvent, JobPlan, JobProgress, PlanStep};
use super::scan::name_of;

/// One entry of the batch: a capture layout plus what analysis found in it.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeJob {
    SingleAvi(SingleAviJob),
    AviFolder(AviFolderJob),
    ImageSequence(ImageSequenceJob),
    CapturedCut(CapturedCutJob),
}

impl EncodeJob {
    /// Display name: the file or folder name.
    pub fn name(&self) -> String {
        name_of(self.source())
    }

    /// The dropped file or folder.
    pub fn source(&self) -> &Path {
        match self {
            EncodeJob::SingleAvi(job) => job.path(),
            EncodeJob::AviFolder(job) => job.folder(),
            EncodeJob::ImageSequence(job) => job.folder(),
            EncodeJob::CapturedCut(job) => job.folder(),
        }
    }

    /// Short label for the layout kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EncodeJob::SingleAvi(_) => "avi",
            EncodeJob::AviFolder(_) => "avi-folder",
            EncodeJob::ImageSequence(_) => "image-sequence",
            EncodeJob::CapturedCut(_) => "captured-cut",
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            EncodeJob::SingleAvi(job) => job.is_valid(),
            EncodeJob::AviFolder(job) => job.is_valid(),
            EncodeJob::ImageSequence(job) => job.is_valid(),
            EncodeJob::CapturedCut(job) => job.is_valid(),
        }
    }

    /// Workload weight of the job in the batch.
    pub fn frame_count(&self) -> u64 {
        match self {
            EncodeJob::SingleAvi(job) => job.frame_count(),
            EncodeJob::AviFolder(job) => job.frame_count(),
            EncodeJob::ImageSequence(job) => job.frame_count(),
            EncodeJob::CapturedCut(job) => job.frame_count(),
        }
    }

    pub fn has_audio(&self) -> bool {
        match self {
            EncodeJob::SingleAvi(job) => job.has_audio(),
            EncodeJob::AviFolder(job) => job.has_audio(),
            EncodeJob::ImageSequence(job) => job.has_audio(),
            EncodeJob::CapturedCut(job) => job.has_audio(),
        }
    }

    /// Number of output videos.
    pub fn video_count(&self) -> usize {
        match self {
            EncodeJob::SingleAvi(_) | EncodeJob::AviFolder(_) => 1,
            EncodeJob::ImageSequence(job) => job.sequences().len(),
            EncodeJob::CapturedCut(job) => job.channel_count(),
        }
    }

    pub fn plan(&self, settings: &Settings) -> JobPlan {
        match self {
            EncodeJob::SingleAvi(job) => job.plan(settings),
            EncodeJob::AviFolder(job) => job.plan(settings),
            EncodeJob::ImageSequence(job) => job.plan(settings),
            EncodeJob::CapturedCut(job) => job.plan(settings),
        }
    }

    /// Run the job's plan through `executor`.
    ///
    /// Only a failure to run the encoder (or to prepare/clean up files) is an
    /// error. A non-zero exit code is logged and the job still succeeds.
    pub fn execute(
        &self,
        settings: &Settings,
        ctx: &mut BatchRunContext,
        log: &BatchLog,
        executor: &mut dyn EncodeExecutor,
        on_event: &mut dyn FnMut(JobEvent),
    ) -> EncodeResult<()> {
        let plan = self.plan(settings);
        let mut progress = JobProgress::new(plan.total_workload());

        for step in &plan.steps {
            match step {
                PlanStep::Rename(renames) => apply_renames(renames, log)?,
                PlanStep::Encode(sub_job) => {
                    let invocation = build_invocation(settings, &sub_job.params, ctx);
                    log.info(&format!(
                        "Processing '{}'",
                        invocation.working_dir.display()
                    ));
                    log.command(&invocation.command_line());
                    for warning in &invocation.warnings {
                        log.warn(warning);
                    }

                    progress.begin(sub_job);
                    let report = executor.run(&invocation, &mut |event: EncoderEvent| {
                        let job_event = match event {
                            EncoderEvent::Progress(percent) => {
                                JobEvent::Progress(progress.on_percent(percent))
                            }
                            EncoderEvent::FrameRate(fps) => JobEvent::FrameRate(fps),
                            EncoderEvent::FrameIndex(index) => JobEvent::FrameIndex(index),
                        };
                        on_event(job_event);
                    })?;
                    progress.end();
                    on_event(JobEvent::Progress(progress.fraction()));

                    if let Some(code) = report.exit_code.filter(|&code| code != 0) {
                        log.warn(&format!("Encoder exited with code {}", code));
                    }
                    if settings.encoder.display_stderr {
                        log.encoder_output(&report.stderr_output);
                    }
                }
                PlanStep::RemoveFile(path) => {
                    if path.exists() {
                        fs::remove_file(path).map_err(|e| {
                            EncodeError::io(format!("removing {}", path.display()), e)
                        })?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Write the job's plan to a batch script instead of running it.
    pub fn export<W: Write>(
        &self,
        settings: &Settings,
        ctx: &mut BatchRunContext,
        log: &BatchLog,
        script: &mut BatchScript<W>,
    ) -> io::Result<()> {
        for step in &self.plan(settings).steps {
            match step {
                PlanStep::Rename(renames) => {
                    for rename in renames {
                        script.write_rename(&rename.from, &name_of(&rename.to))?;
                    }
                }
                PlanStep::Encode(sub_job) => {
                    let invocation = build_invocation(settings, &sub_job.params, ctx);
                    for warning in &invocation.warnings {
                        log.warn(warning);
                    }
                    script.write_invocation(&invocation)?;
                }
                PlanStep::RemoveFile(path) => script.write_delete(&name_of(path))?,
            }
        }
        Ok(())
    }
}

/// Rename image files in order. On failure the renames already applied are
/// logged so the folder can be restored by hand.
fn apply_renames(renames: &[FileRename], log: &BatchLog) -> EncodeResult<()> {
    log.warn(&format!("Renaming {} image files", renames.len()));
    for (applied, rename) in renames.iter().enumerate() {
        if let Err(e) = fs::rename(&rename.from, &rename.to) {
            log.error(&format!(
                "Renaming stopped after {} of {} files",
                applied,
                renames.len()
            ));
            for done in &renames[..applied] {
                log.warn(&format!(
                    "Already renamed '{}' to '{}'",
                    name_of(&done.from),
                    name_of(&done.to)
                ));
            }
            return Err(EncodeError::io(
                format!("renaming {}", rename.from.display()),
                e,
            ));
        }
    }
    Ok(())
}
