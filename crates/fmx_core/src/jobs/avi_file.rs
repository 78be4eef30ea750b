//! A single AVI file, optionally with a separate audio file.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::encoder::EncodeParams;
use crate::models::AviStreamInfo;
use crate::sequence::apply_naming_policy;

use super::errors::{AnalyzeError, AnalyzeResult};
use super::plan::{JobPlan, PlanStep, SubJob};
use super::scan::{name_of, output_dir, parent_or_current};

#[derive(Debug, Clone, PartialEq)]
pub struct SingleAviJob {
    path: PathBuf,
    audio_path: Option<PathBuf>,
    info: AviStreamInfo,
}

impl SingleAviJob {
    /// Read the container headers of `path`.
    pub fn analyze(path: impl Into<PathBuf>) -> AnalyzeResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(AnalyzeError::NotFound(path));
        }

        let info = AviStreamInfo::from_path(&path);
        tracing::debug!(
            "{}: valid={} frames={} video={} audio={}",
            path.display(),
            info.is_valid,
            info.frame_count,
            info.video_stream_count,
            info.audio_stream_count
        );

        Ok(Self {
            path,
            audio_path: None,
            info,
        })
    }

    /// Mux `audio_path` into the output instead of any in-stream audio.
    pub fn with_audio(mut self, audio_path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(audio_path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &AviStreamInfo {
        &self.info
    }

    pub fn is_valid(&self) -> bool {
        self.info.is_valid && self.info.frame_count > 0
    }

    pub fn frame_count(&self) -> u64 {
        self.info.workload()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_path.is_some() || self.info.has_audio()
    }

    /// Output next to the input (or in the shared folder), renamed by policy.
    pub fn output_path(&self, settings: &Settings) -> PathBuf {
        let folder = parent_or_current(&self.path);
        let name = apply_naming_policy(&name_of(&self.path), &settings.output);
        output_dir(&settings.output, &folder).join(name)
    }

    pub fn plan(&self, settings: &Settings) -> JobPlan {
        let mut params = EncodeParams::videos(
            parent_or_current(&self.path),
            vec![self.path.to_string_lossy().to_string()],
            self.output_path(settings),
        );
        params.avi_has_audio = self.info.has_audio();
        if let Some(audio) = &self.audio_path {
            params = params.with_audio(audio);
        }

        let mut plan = JobPlan::default();
        plan.push(PlanStep::Encode(SubJob::new(
            params,
            vec![self.frame_count()],
        )));
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avi::test_support::write_avi;
    use crate::models::FileNamingPolicy;
    use tempfile::tempdir;

    #[test]
    fn analyzes_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_avi(&path, 120, 1, 1);

        let job = SingleAviJob::analyze(&path).unwrap();
        assert!(job.is_valid());
        assert_eq!(job.frame_count(), 120);
        assert!(job.has_audio());
    }

    #[test]
    fn zero_frames_is_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.avi");
        write_avi(&path, 0, 1, 0);

        assert!(!SingleAviJob::analyze(&path).unwrap().is_valid());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = SingleAviJob::analyze(dir.path().join("gone.avi")).unwrap_err();
        assert!(matches!(err, AnalyzeError::NotFound(_)));
    }

    #[test]
    fn plan_copies_in_stream_audio_and_applies_naming() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_avi(&path, 60, 1, 1);

        let mut settings = Settings::default();
        settings.output.naming_policy = FileNamingPolicy::AddSuffix;
        settings.output.suffix = "_lag".to_string();

        let plan = SingleAviJob::analyze(&path).unwrap().plan(&settings);
        let sub = plan.sub_jobs().next().unwrap();
        assert_eq!(plan.encode_count(), 1);
        assert!(sub.params.avi_has_audio);
        assert!(!sub.params.use_separate_audio);
        assert_eq!(sub.params.output_path, dir.path().join("clip_lag.avi"));
        assert_eq!(sub.segments, vec![60]);
    }

    #[test]
    fn attached_audio_uses_separate_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.avi");
        write_avi(&path, 60, 1, 0);
        let audio = dir.path().join("clip.wav");

        let job = SingleAviJob::analyze(&path).unwrap().with_audio(&audio);
        assert!(job.has_audio());
        let plan = job.plan(&Settings::default());
        let sub = plan.sub_jobs().next().unwrap();
        assert!(sub.params.use_separate_audio);
        assert_eq!(sub.params.audio_path.as_deref(), Some(audio.as_path()));
    }
}
