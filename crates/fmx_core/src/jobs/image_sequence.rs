//! Loose image sequences in one folder, each encoded on its own.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::encoder::EncodeParams;
use crate::models::{ImageSequence, SequenceNaming};
use crate::sequence::{group_sequences, resolve_simple_names};

use super::errors::{AnalyzeError, AnalyzeResult};
use super::plan::{JobPlan, PlanStep, SubJob};
use super::scan::{
    first_audio_file, list_files, name_of, output_dir, parent_or_current, IMAGE_EXTENSIONS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSequenceJob {
    folder: PathBuf,
    sequences: Vec<ImageSequence>,
    audio_path: Option<PathBuf>,
}

impl ImageSequenceJob {
    /// Group the folder's images, one extension at a time.
    pub fn analyze(folder: impl Into<PathBuf>, naming: SequenceNaming) -> AnalyzeResult<Self> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(AnalyzeError::NotFound(folder));
        }

        let folder_name = name_of(&folder);
        let mut sequences = Vec::new();
        for extension in IMAGE_EXTENSIONS {
            let files = list_files(&folder, extension)?;
            if files.is_empty() {
                continue;
            }
            sequences.extend(group_sequences(&files, &folder_name, naming));
        }
        resolve_simple_names(&mut sequences, &folder_name, naming);

        Ok(Self {
            audio_path: first_audio_file(&folder)?,
            folder,
            sequences,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn sequences(&self) -> &[ImageSequence] {
        &self.sequences
    }

    pub fn frame_count(&self) -> u64 {
        self.sequences.iter().map(ImageSequence::frame_count).sum()
    }

    pub fn is_valid(&self) -> bool {
        !self.sequences.is_empty()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_path.is_some()
    }

    pub fn plan(&self, settings: &Settings) -> JobPlan {
        let out_dir = output_dir(&settings.output, &parent_or_current(&self.folder));
        let mut plan = JobPlan::default();

        for sequence in &self.sequences {
            let mut params = EncodeParams::sequence(
                &self.folder,
                sequence.pattern.clone(),
                out_dir.join(&sequence.output_name),
            );
            params.monochrome = sequence.is_monochrome();
            if let (Some(audio), false) = (&self.audio_path, sequence.is_monochrome()) {
                params = params.with_audio(audio);
            }
            plan.push(PlanStep::Encode(SubJob::new(
                params,
                vec![sequence.frame_count()],
            )));
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::EncodeInput;
    use std::fs;
    use tempfile::tempdir;

    fn touch(folder: &Path, names: &[&str]) {
        for name in names {
            fs::write(folder.join(name), b"img").unwrap();
        }
    }

    #[test]
    fn colour_and_depth_sequences_with_audio() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("demo");
        fs::create_dir(&folder).unwrap();
        touch(
            &folder,
            &[
                "shot.0001.tga",
                "shot.0002.tga",
                "shot.0003.tga",
                "shot.depth.0001.tga",
                "shot.depth.0002.tga",
                "demo.wav",
            ],
        );

        let job = ImageSequenceJob::analyze(&folder, SequenceNaming::FolderName).unwrap();
        assert!(job.is_valid());
        assert!(job.has_audio());
        assert_eq!(job.sequences().len(), 2);
        assert_eq!(job.frame_count(), 5);

        let plan = job.plan(&Settings::default());
        let subs: Vec<&SubJob> = plan.sub_jobs().collect();
        assert_eq!(subs.len(), 2);

        let colour = subs.iter().find(|s| !s.params.monochrome).unwrap();
        let depth = subs.iter().find(|s| s.params.monochrome).unwrap();
        assert!(colour.params.use_separate_audio);
        assert!(!depth.params.use_separate_audio);
        assert_eq!(
            colour.params.input,
            EncodeInput::Sequence {
                pattern: Some("shot.*.tga".to_string())
            }
        );
        assert_eq!(colour.segments, vec![3]);
        assert_eq!(colour.params.output_path.parent(), Some(dir.path()));
    }

    #[test]
    fn folder_of_singletons_is_invalid() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["cover.png", "poster.jpg"]);

        let job = ImageSequenceJob::analyze(dir.path(), SequenceNaming::FolderName).unwrap();
        assert!(!job.is_valid());
        assert_eq!(job.frame_count(), 0);
    }

    #[test]
    fn sequences_across_extensions() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a_01.png", "a_02.png", "b_01.jpg", "b_02.jpg"]);

        let job = ImageSequenceJob::analyze(dir.path(), SequenceNaming::ImageName).unwrap();
        let names: Vec<&str> = job
            .sequences()
            .iter()
            .map(|s| s.output_name.as_str())
            .collect();
        assert_eq!(names, vec!["a_.avi", "b_.avi"]);
    }
}
