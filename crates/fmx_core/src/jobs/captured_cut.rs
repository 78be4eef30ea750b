//! Structured capture layout: a demo folder holding cut folders.
//!
//! ```text
//! demo/
//!   time_0815_framerate_60/
//!     colour/  frame_1.tga frame_2.tga ... frame_120.tga
//!     depth/   frame_1.tga ...
//!     audio.wav
//! ```
//!
//! Each cut folder name carries the frame rate used for its channels, as both
//! input and output rate. Channel images are ordered by their numeric index,
//! then renamed to a uniform digit width so the encoder's wildcard sorts them
//! correctly. When the first image's signature says it is a different format
//! than its extension claims, every file of the channel is renamed to the
//! detected extension.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Settings;
use crate::encoder::EncodeParams;
use crate::models::{ChannelKind, ImageSequence};
use crate::sequence::{sequence_pattern, sequence_skeleton};

use super::errors::{AnalyzeError, AnalyzeResult};
use super::plan::{FileRename, JobPlan, PlanStep, SubJob};
use super::scan::{
    first_audio_file, list_files, list_folders, name_of, output_dir, parent_or_current,
};

/// Channel image formats, in probing priority.
const CUT_IMAGE_EXTENSIONS: &[&str] = &["tga", "png", "bmp", "jpg", "jpeg"];

const CUT_FOLDER_PATTERN: &str = r"^time.*_framerate_?(\d+(\.\d+)?)$";

static CUT_FOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(CUT_FOLDER_PATTERN).ok());

/// Bytes read from the first image for format sniffing.
const SNIFF_LEN: u64 = 32;

/// Frame rate declared by a cut folder name, `None` if it is not a cut.
pub fn cut_frame_rate(folder_name: &str) -> Option<f64> {
    let re = CUT_FOLDER.as_ref()?;
    let lower = folder_name.to_lowercase();
    let caps = re.captures(&lower)?;
    caps[1].parse().ok()
}

/// Whether `folder` directly contains at least one cut folder.
pub fn has_cut_folders(folder: &Path) -> bool {
    list_folders(folder)
        .map(|folders| {
            folders
                .iter()
                .any(|f| cut_frame_rate(&name_of(f)).is_some())
        })
        .unwrap_or(false)
}

/// One image channel of a cut.
#[derive(Debug, Clone, PartialEq)]
pub struct CutChannel {
    pub kind: ChannelKind,
    pub folder: PathBuf,
    /// File paths as they will be after `renames`.
    pub sequence: ImageSequence,
    pub renames: Vec<FileRename>,
}

/// One time-bounded capture segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub folder: PathBuf,
    pub frame_rate: f64,
    pub audio_path: Option<PathBuf>,
    pub channels: Vec<CutChannel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCutJob {
    folder: PathBuf,
    cuts: Vec<Cut>,
}

impl CapturedCutJob {
    pub fn analyze(folder: impl Into<PathBuf>) -> AnalyzeResult<Self> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(AnalyzeError::NotFound(folder));
        }

        let demo_name = name_of(&folder);
        let mut cuts = Vec::new();
        for cut_folder in list_folders(&folder)? {
            let Some(frame_rate) = cut_frame_rate(&name_of(&cut_folder)) else {
                continue;
            };
            let cut = analyze_cut(&demo_name, cut_folder, frame_rate)?;
            if cut.channels.is_empty() {
                tracing::warn!("Cut '{}' has no usable channel", cut.folder.display());
                continue;
            }
            cuts.push(cut);
        }

        Ok(Self { folder, cuts })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    pub fn channel_count(&self) -> usize {
        self.cuts.iter().map(|c| c.channels.len()).sum()
    }

    pub fn frame_count(&self) -> u64 {
        self.cuts
            .iter()
            .flat_map(|c| &c.channels)
            .map(|ch| ch.sequence.frame_count())
            .sum()
    }

    pub fn is_valid(&self) -> bool {
        self.channel_count() > 0
    }

    pub fn has_audio(&self) -> bool {
        self.cuts.iter().any(|c| c.audio_path.is_some())
    }

    pub fn plan(&self, settings: &Settings) -> JobPlan {
        let out_dir = output_dir(&settings.output, &parent_or_current(&self.folder));
        let mut plan = JobPlan::default();

        for cut in &self.cuts {
            for channel in &cut.channels {
                if !channel.renames.is_empty() {
                    plan.push(PlanStep::Rename(channel.renames.clone()));
                }

                let mut params = EncodeParams::sequence(
                    &channel.folder,
                    channel.sequence.pattern.clone(),
                    out_dir.join(&channel.sequence.output_name),
                );
                params.monochrome = channel.kind.is_monochrome();
                params.frame_rate_override = Some(cut.frame_rate);
                if let (ChannelKind::Colour, Some(audio)) = (channel.kind, &cut.audio_path) {
                    params = params.with_audio(audio);
                }

                plan.push(PlanStep::Encode(SubJob::new(
                    params,
                    vec![channel.sequence.frame_count()],
                )));
            }
        }

        plan
    }
}

fn channel_kind(folder_name: &str) -> Option<ChannelKind> {
    match folder_name.to_lowercase().as_str() {
        "colour" | "color" => Some(ChannelKind::Colour),
        "depth" => Some(ChannelKind::Depth),
        _ => None,
    }
}

fn analyze_cut(demo_name: &str, cut_folder: PathBuf, frame_rate: f64) -> AnalyzeResult<Cut> {
    let cut_name = name_of(&cut_folder);

    let mut channel_folders: Vec<(ChannelKind, PathBuf)> = list_folders(&cut_folder)?
        .into_iter()
        .filter_map(|f| channel_kind(&name_of(&f)).map(|kind| (kind, f)))
        .collect();
    // Colour before depth.
    channel_folders.sort_by_key(|(kind, _)| *kind != ChannelKind::Colour);

    let mut channels = Vec::new();
    for (kind, folder) in channel_folders {
        let output_name = format!("{}_{}_{}.avi", demo_name, cut_name, kind);
        if let Some(channel) = analyze_channel(kind, folder, output_name)? {
            channels.push(channel);
        }
    }

    tracing::debug!(
        "Cut '{}' at {} fps: {} channel(s)",
        cut_name,
        frame_rate,
        channels.len()
    );

    Ok(Cut {
        audio_path: first_audio_file(&cut_folder)?,
        folder: cut_folder,
        frame_rate,
        channels,
    })
}

/// A channel image split around its numeric index.
struct NumberedImage {
    path: PathBuf,
    prefix: String,
    index: u64,
    suffix: String,
    extension: String,
}

/// Split `stem` at its last run of digits.
fn split_index(stem: &str) -> Option<(String, u64, String)> {
    let bytes = stem.as_bytes();
    let end = bytes.iter().rposition(|b| b.is_ascii_digit())? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |p| p + 1);
    let index = stem[start..end].parse().ok()?;
    Some((stem[..start].to_string(), index, stem[end..].to_string()))
}

fn numbered_image(path: PathBuf) -> Option<NumberedImage> {
    let stem = path.file_stem()?.to_string_lossy().to_string();
    let extension = path.extension()?.to_string_lossy().to_string();
    let (prefix, index, suffix) = split_index(&stem)?;
    Some(NumberedImage {
        path,
        prefix,
        index,
        suffix,
        extension,
    })
}

/// Extension matching the file's signature, when it disagrees with `current`.
fn sniffed_extension(path: &Path, current: &str) -> Option<&'static str> {
    let mut header = Vec::new();
    let read = File::open(path).and_then(|f| f.take(SNIFF_LEN).read_to_end(&mut header));
    if let Err(e) = read {
        tracing::debug!("Cannot sniff {}: {}", path.display(), e);
        return None;
    }

    let format = image::guess_format(&header).ok()?;
    let extensions = format.extensions_str();
    if extensions.iter().any(|e| e.eq_ignore_ascii_case(current)) {
        None
    } else {
        extensions.first().copied()
    }
}

/// Whether applying `rename` would replace a file other than its source.
///
/// A target differing from its source only in case is the same file on
/// case-insensitive file systems.
fn overwrites_other_file(rename: &FileRename) -> bool {
    rename.to.exists()
        && !rename
            .to
            .to_string_lossy()
            .eq_ignore_ascii_case(&rename.from.to_string_lossy())
}

fn analyze_channel(
    kind: ChannelKind,
    folder: PathBuf,
    output_name: String,
) -> AnalyzeResult<Option<CutChannel>> {
    let mut files = Vec::new();
    for extension in CUT_IMAGE_EXTENSIONS {
        files = list_files(&folder, extension)?;
        if !files.is_empty() {
            break;
        }
    }

    let mut images: Vec<NumberedImage> = files.into_iter().filter_map(numbered_image).collect();
    images.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
    images.dedup_by(|later, earlier| {
        let duplicate = later.index == earlier.index;
        if duplicate {
            tracing::warn!(
                "Skipping '{}': index {} already used",
                later.path.display(),
                later.index
            );
        }
        duplicate
    });

    if images.len() < 2 {
        tracing::warn!(
            "Channel '{}' has fewer than two numbered images",
            folder.display()
        );
        return Ok(None);
    }

    let width = images
        .last()
        .map(|img| img.index.to_string().len())
        .unwrap_or(1);

    let fixed_extension = sniffed_extension(&images[0].path, &images[0].extension);
    if let Some(extension) = fixed_extension {
        tracing::warn!(
            "Images in '{}' are not .{} files, renaming {} files to .{}",
            folder.display(),
            images[0].extension,
            images.len(),
            extension
        );
    }

    let mut renames = Vec::new();
    let mut file_paths = Vec::with_capacity(images.len());
    for image in &images {
        let extension = fixed_extension.unwrap_or(image.extension.as_str());
        let name = format!(
            "{}{:0width$}{}.{}",
            image.prefix,
            image.index,
            image.suffix,
            extension,
            width = width
        );
        let target = folder.join(name);
        if target != image.path {
            renames.push(FileRename {
                from: image.path.clone(),
                to: target.clone(),
            });
        }
        file_paths.push(target);
    }

    if let Some(clash) = renames.iter().find(|r| overwrites_other_file(r)) {
        tracing::warn!(
            "Skipping channel '{}': renaming '{}' would overwrite '{}'",
            folder.display(),
            name_of(&clash.from),
            name_of(&clash.to)
        );
        return Ok(None);
    }

    let first_name = name_of(&file_paths[0]);
    let sequence = ImageSequence {
        pattern: sequence_pattern(&first_name),
        skeleton: sequence_skeleton(&first_name.to_lowercase()),
        channel: kind,
        output_name,
        wants_simple_name: false,
        file_paths,
    };

    Ok(Some(CutChannel {
        kind,
        folder,
        sequence,
        renames,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn write_images(folder: &Path, names: &[String], bytes: &[u8]) {
        fs::create_dir_all(folder).unwrap();
        for name in names {
            fs::write(folder.join(name), bytes).unwrap();
        }
    }

    fn frames(prefix: &str, range: std::ops::RangeInclusive<u32>, ext: &str) -> Vec<String> {
        range.map(|i| format!("{}{}.{}", prefix, i, ext)).collect()
    }

    #[test]
    fn parses_cut_folder_rate() {
        assert_eq!(cut_frame_rate("time_0815_framerate_60"), Some(60.0));
        assert_eq!(cut_frame_rate("Time01_Framerate29.97"), Some(29.97));
        assert_eq!(cut_frame_rate("colour"), None);
        assert_eq!(cut_frame_rate("time_01_framerate_"), None);
    }

    #[test]
    fn splits_last_digit_run() {
        assert_eq!(
            split_index("take2_frame_0012_x"),
            Some(("take2_frame_".to_string(), 12, "_x".to_string()))
        );
        assert_eq!(split_index("7"), Some((String::new(), 7, String::new())));
        assert_eq!(split_index("cover"), None);
    }

    #[test]
    fn normalizes_width_and_fixes_extension() {
        let dir = tempdir().unwrap();
        let demo = dir.path().join("demo");
        let cut = demo.join("time_0815_framerate_30");
        write_images(&cut.join("colour"), &frames("frame_", 1..=10, "tga"), b"tga");
        write_images(&cut.join("depth"), &frames("d", 1..=3, "tga"), PNG_MAGIC);
        fs::write(cut.join("cut.wav"), b"RIFF").unwrap();
        fs::create_dir_all(demo.join("notes")).unwrap();

        assert!(has_cut_folders(&demo));
        let job = CapturedCutJob::analyze(&demo).unwrap();
        assert!(job.is_valid());
        assert_eq!(job.channel_count(), 2);
        assert_eq!(job.frame_count(), 13);
        assert!(job.has_audio());

        let colour = &job.cuts()[0].channels[0];
        assert_eq!(colour.kind, ChannelKind::Colour);
        assert_eq!(colour.sequence.file_paths[1], cut.join("colour").join("frame_02.tga"));
        assert_eq!(colour.sequence.file_paths[9], cut.join("colour").join("frame_10.tga"));
        assert_eq!(colour.renames.len(), 9);
        assert_eq!(colour.sequence.pattern, "frame_*.tga");
        assert_eq!(colour.sequence.output_name, "demo_time_0815_framerate_30_colour.avi");

        let depth = &job.cuts()[0].channels[1];
        assert_eq!(depth.kind, ChannelKind::Depth);
        assert_eq!(depth.renames.len(), 3);
        assert_eq!(depth.sequence.pattern, "d*.png");
    }

    #[test]
    fn plan_uses_cut_rate_and_colour_audio() {
        let dir = tempdir().unwrap();
        let demo = dir.path().join("demo");
        let cut = demo.join("time_1_framerate_24");
        write_images(&cut.join("color"), &frames("c_", 10..=12, "png"), PNG_MAGIC);
        write_images(&cut.join("depth"), &frames("z_", 10..=12, "png"), PNG_MAGIC);
        fs::write(cut.join("cut.wav"), b"RIFF").unwrap();

        let plan = CapturedCutJob::analyze(&demo).unwrap().plan(&Settings::default());
        assert!(!plan.steps.iter().any(|s| matches!(s, PlanStep::Rename(_))));

        let subs: Vec<&SubJob> = plan.sub_jobs().collect();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].params.frame_rate_override, Some(24.0));
        assert!(subs[0].params.use_separate_audio);
        assert!(!subs[0].params.monochrome);
        assert!(subs[1].params.monochrome);
        assert!(!subs[1].params.use_separate_audio);
        assert_eq!(
            subs[1].params.output_path,
            dir.path().join("demo_time_1_framerate_24_depth.avi")
        );
    }

    #[test]
    fn channel_with_one_image_is_dropped() {
        let dir = tempdir().unwrap();
        let demo = dir.path().join("demo");
        write_images(
            &demo.join("time_2_framerate_60").join("colour"),
            &frames("f", 1..=1, "tga"),
            b"tga",
        );

        let job = CapturedCutJob::analyze(&demo).unwrap();
        assert!(!job.is_valid());
        assert!(job.cuts().is_empty());
    }

    #[test]
    fn channel_is_dropped_when_a_rename_would_overwrite_a_file() {
        let dir = tempdir().unwrap();
        let demo = dir.path().join("demo");
        let cut = demo.join("time_3_framerate_60");
        write_images(&cut.join("colour"), &frames("f_", 1..=2, "tga"), b"tga");
        let depth = cut.join("depth");
        write_images(&depth, &frames("d", 1..=2, "tga"), PNG_MAGIC);
        fs::write(depth.join("d1.png"), b"KEEP-ME").unwrap();

        let job = CapturedCutJob::analyze(&demo).unwrap();
        let kinds: Vec<ChannelKind> = job.cuts()[0].channels.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChannelKind::Colour]);

        let plan = job.plan(&Settings::default());
        assert!(!plan.steps.iter().any(|s| matches!(s, PlanStep::Rename(_))));
        assert_eq!(fs::read(depth.join("d1.png")).unwrap(), b"KEEP-ME");
        assert!(depth.join("d1.tga").exists());
    }

    #[test]
    fn width_padding_collision_drops_channel() {
        let dir = tempdir().unwrap();
        let demo = dir.path().join("demo");
        let colour = demo.join("time_4_framerate_30").join("colour");
        write_images(&colour, &frames("f_", 1..=10, "tga"), b"tga");
        // Not a frame of this channel, but it sits where f_2 would go.
        fs::create_dir_all(colour.join("f_02.tga")).unwrap();

        let job = CapturedCutJob::analyze(&demo).unwrap();
        assert!(!job.is_valid());
    }

    #[test]
    fn folder_without_cuts() {
        let dir = tempdir().unwrap();
        assert!(!has_cut_folders(dir.path()));
        assert!(!CapturedCutJob::analyze(dir.path()).unwrap().is_valid());
    }
}
