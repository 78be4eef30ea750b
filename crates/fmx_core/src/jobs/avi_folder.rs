//! All AVI files of one folder muxed into a single output.
//!
//! The encoder cannot attach one audio file to several video inputs in one
//! run, so a folder with more than one video and an audio file is encoded in
//! two passes: videos into `temp.avi`, then `temp.avi` plus audio with a
//! stream copy into the final file.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::encoder::EncodeParams;
use crate::models::{AviStreamInfo, VideoCodec};

use super::errors::{AnalyzeError, AnalyzeResult};
use super::plan::{JobPlan, PlanStep, SubJob, TEMP_FILE_NAME};
use super::scan::{first_audio_file, list_files, name_of, output_dir, parent_or_current};

#[derive(Debug, Clone, PartialEq)]
pub struct AviFolderJob {
    folder: PathBuf,
    /// Valid members only, in name order.
    videos: Vec<(PathBuf, AviStreamInfo)>,
    audio_path: Option<PathBuf>,
}

impl AviFolderJob {
    pub fn analyze(folder: impl Into<PathBuf>) -> AnalyzeResult<Self> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(AnalyzeError::NotFound(folder));
        }

        let videos = list_files(&folder, "avi")?
            .into_iter()
            .filter_map(|path| {
                let info = AviStreamInfo::from_path(&path);
                if info.is_valid {
                    Some((path, info))
                } else {
                    tracing::debug!("Skipping invalid AVI {}", path.display());
                    None
                }
            })
            .collect();

        Ok(Self {
            audio_path: first_audio_file(&folder)?,
            folder,
            videos,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.videos.iter().map(|(_, info)| info.workload()).sum()
    }

    pub fn is_valid(&self) -> bool {
        self.frame_count() > 0
    }

    fn avi_has_audio(&self) -> bool {
        self.videos.iter().any(|(_, info)| info.has_audio())
    }

    pub fn has_audio(&self) -> bool {
        self.audio_path.is_some() || self.avi_has_audio()
    }

    pub fn needs_two_pass(&self) -> bool {
        self.audio_path.is_some() && self.videos.len() > 1
    }

    /// `<folder name>.avi` in the folder's parent (or the shared folder).
    pub fn output_path(&self, settings: &Settings) -> PathBuf {
        let parent = parent_or_current(&self.folder);
        output_dir(&settings.output, &parent).join(format!("{}.avi", name_of(&self.folder)))
    }

    pub fn plan(&self, settings: &Settings) -> JobPlan {
        let inputs: Vec<String> = self.videos.iter().map(|(path, _)| name_of(path)).collect();
        let segments: Vec<u64> = self.videos.iter().map(|(_, info)| info.workload()).collect();
        let output = self.output_path(settings);
        let mut plan = JobPlan::default();

        if !self.needs_two_pass() {
            let mut params = EncodeParams::videos(&self.folder, inputs, output);
            params.avi_has_audio = self.avi_has_audio();
            if let Some(audio) = &self.audio_path {
                params = params.with_audio(audio);
            }
            plan.push(PlanStep::Encode(SubJob::new(params, segments)));
            return plan;
        }

        let mut first_pass = EncodeParams::videos(&self.folder, inputs, TEMP_FILE_NAME);
        first_pass.avi_has_audio = self.avi_has_audio();
        plan.push(PlanStep::Encode(SubJob::new(first_pass, segments)));

        let mut final_pass =
            EncodeParams::videos(&self.folder, vec![TEMP_FILE_NAME.to_string()], output);
        if let Some(audio) = &self.audio_path {
            final_pass = final_pass.with_audio(audio);
        }
        final_pass.codec_override = Some(VideoCodec::Copy);
        plan.push(PlanStep::Encode(SubJob::new(
            final_pass,
            vec![self.frame_count()],
        )));

        plan.push(PlanStep::RemoveFile(self.folder.join(TEMP_FILE_NAME)));
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avi::test_support::write_avi;
    use crate::encoder::EncodeInput;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn skips_invalid_members_and_sums_frames() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("session");
        fs::create_dir(&folder).unwrap();
        write_avi(&folder.join("a.avi"), 100, 1, 0);
        write_avi(&folder.join("b.avi"), 50, 1, 1);
        fs::write(folder.join("broken.avi"), b"not an avi").unwrap();

        let job = AviFolderJob::analyze(&folder).unwrap();
        assert_eq!(job.video_count(), 2);
        assert_eq!(job.frame_count(), 150);
        assert!(job.is_valid());
        assert!(job.has_audio());
        assert!(!job.needs_two_pass());
    }

    #[test]
    fn folder_without_videos_is_invalid() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("take.wav"), b"RIFF").unwrap();

        let job = AviFolderJob::analyze(dir.path()).unwrap();
        assert!(!job.is_valid());
    }

    #[test]
    fn one_video_with_audio_is_single_pass() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("take");
        fs::create_dir(&folder).unwrap();
        write_avi(&folder.join("take.avi"), 90, 1, 0);
        fs::write(folder.join("take.wav"), b"RIFF").unwrap();

        let plan = AviFolderJob::analyze(&folder).unwrap().plan(&Settings::default());
        assert_eq!(plan.encode_count(), 1);
        assert_eq!(plan.steps.len(), 1);

        let sub = plan.sub_jobs().next().unwrap();
        assert!(sub.params.use_separate_audio);
        assert_eq!(sub.params.output_path, dir.path().join("take.avi"));
    }

    #[test]
    fn several_videos_with_audio_take_two_passes() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("take");
        fs::create_dir(&folder).unwrap();
        write_avi(&folder.join("part1.avi"), 100, 1, 0);
        write_avi(&folder.join("part2.avi"), 50, 1, 0);
        fs::write(folder.join("take.wav"), b"RIFF").unwrap();

        let job = AviFolderJob::analyze(&folder).unwrap();
        assert!(job.needs_two_pass());
        let plan = job.plan(&Settings::default());

        assert_eq!(plan.encode_count(), 2);
        assert_eq!(plan.total_workload(), 300);
        assert_eq!(
            plan.steps.last(),
            Some(&PlanStep::RemoveFile(folder.join(TEMP_FILE_NAME)))
        );

        let subs: Vec<&SubJob> = plan.sub_jobs().collect();
        assert_eq!(
            subs[0].params.input,
            EncodeInput::Videos(vec!["part1.avi".into(), "part2.avi".into()])
        );
        assert_eq!(subs[0].params.output_path, PathBuf::from(TEMP_FILE_NAME));
        assert!(!subs[0].params.use_separate_audio);
        assert_eq!(subs[0].segments, vec![100, 50]);

        assert_eq!(subs[1].params.input, EncodeInput::Videos(vec![TEMP_FILE_NAME.into()]));
        assert!(subs[1].params.use_separate_audio);
        assert_eq!(subs[1].params.codec_override, Some(VideoCodec::Copy));
        assert_eq!(subs[1].params.output_path, dir.path().join("take.avi"));
    }
}
