//! Encoder argument building.
//!
//! Maps the global settings plus one sub-job's parameters to an
//! [`EncoderInvocation`]. Argument order follows the encoder's expectations:
//!
//! 1. input clause (`mf://pattern -mf fps=N` or `-fps N "a.avi" ...`)
//! 2. start offset `-ss` when frames are skipped
//! 3. audio (`-audiofile "x.wav" -oac copy`, or `-oac copy` for in-stream audio)
//! 4. video codec options
//! 5. `-ofps` for image sequences whose output rate differs
//! 6. `-of avi -o "out.avi"`
//!
//! Precondition problems never abort the build; they are collected as
//! warnings on the invocation.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::models::VideoCodec;
use crate::orchestrator::BatchRunContext;

use super::invocation::{EncoderArg, EncoderInvocation};

/// What the encoder reads.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodeInput {
    /// Numbered images matched by a wildcard pattern, e.g. `shot_*.tga`.
    Sequence { pattern: Option<String> },
    /// One or more AVI files, concatenated in order.
    Videos(Vec<String>),
}

/// Parameters for one encoder invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParams {
    pub working_dir: PathBuf,
    pub input: EncodeInput,
    /// The single AVI input already carries audio to copy through.
    pub avi_has_audio: bool,
    pub audio_path: Option<PathBuf>,
    pub use_separate_audio: bool,
    pub output_path: PathBuf,
    /// Selects the monochrome codec settings and dialog flag.
    pub monochrome: bool,
    pub codec_override: Option<VideoCodec>,
    /// Used as both input and output rate when set.
    pub frame_rate_override: Option<f64>,
}

impl EncodeParams {
    /// Parameters for an image sequence in `working_dir`.
    pub fn sequence(
        working_dir: impl Into<PathBuf>,
        pattern: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            input: EncodeInput::Sequence {
                pattern: Some(pattern.into()),
            },
            avi_has_audio: false,
            audio_path: None,
            use_separate_audio: false,
            output_path: output_path.into(),
            monochrome: false,
            codec_override: None,
            frame_rate_override: None,
        }
    }

    /// Parameters for AVI inputs in `working_dir`.
    pub fn videos(
        working_dir: impl Into<PathBuf>,
        inputs: Vec<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            input: EncodeInput::Videos(inputs),
            avi_has_audio: false,
            audio_path: None,
            use_separate_audio: false,
            output_path: output_path.into(),
            monochrome: false,
            codec_override: None,
            frame_rate_override: None,
        }
    }

    /// Attach a separate audio file.
    pub fn with_audio(mut self, audio_path: impl Into<PathBuf>) -> Self {
        self.audio_path = Some(audio_path.into());
        self.use_separate_audio = true;
        self
    }

    fn is_sequence(&self) -> bool {
        matches!(self.input, EncodeInput::Sequence { .. })
    }

    fn video_count(&self) -> usize {
        match &self.input {
            EncodeInput::Videos(videos) => videos.len(),
            EncodeInput::Sequence { .. } => 0,
        }
    }
}

/// Rates print without a fraction when integral (`60`), shortest form otherwise.
pub fn format_rate(rate: f64) -> String {
    format!("{}", rate)
}

/// Build the invocation for one sub-job.
///
/// Marks the codec dialog as shown in `ctx` the first time a dialog-capable
/// codec with `show_dialog` is used for a channel kind.
pub fn build_invocation(
    settings: &Settings,
    params: &EncodeParams,
    ctx: &mut BatchRunContext,
) -> EncoderInvocation {
    let working_dir = absolute_or_self(&params.working_dir);
    let codec_settings = if params.monochrome {
        &settings.monochrome_codec
    } else {
        &settings.color_codec
    };
    let codec = params.codec_override.unwrap_or(codec_settings.codec);
    let input_rate = params
        .frame_rate_override
        .unwrap_or(settings.encoder.frame_rate);
    let output_rate = params
        .frame_rate_override
        .unwrap_or(settings.encoder.output_frame_rate);

    let audio_file = params.audio_path.as_deref().filter(|p| p.is_file());

    let mut warnings = Vec::new();
    if matches!(params.input, EncodeInput::Sequence { pattern: None }) {
        warnings.push(
            "Told to use an image sequence but none was specified. The format is like this: *.tga"
                .to_string(),
        );
    }
    if params.video_count() > 1 && params.use_separate_audio {
        warnings.push("Can't mux multiple .avi files with 1 .wav".to_string());
    }
    if params.use_separate_audio && audio_file.is_none() {
        warnings.push("Told to use an audio file but none valid was specified".to_string());
    }

    let mut args = Vec::new();
    match &params.input {
        EncodeInput::Sequence { pattern } => {
            args.push(EncoderArg::plain(format!(
                "mf://{}",
                pattern.as_deref().unwrap_or_default()
            )));
            args.push(EncoderArg::plain("-mf"));
            args.push(EncoderArg::plain(format!("fps={}", format_rate(input_rate))));
        }
        EncodeInput::Videos(videos) => {
            args.push(EncoderArg::plain("-fps"));
            args.push(EncoderArg::plain(format_rate(input_rate)));
            args.extend(videos.iter().map(EncoderArg::path));
        }
    }

    let skip = settings.encoder.frames_to_skip;
    if skip > 0 && output_rate > 0.0 {
        let start_seconds = f64::from(skip) / output_rate;
        args.push(EncoderArg::plain("-ss"));
        args.push(EncoderArg::plain(format!("{}", start_seconds)));
    }

    if let (true, Some(audio)) = (params.use_separate_audio, audio_file) {
        args.push(EncoderArg::plain("-audiofile"));
        args.push(EncoderArg::path(relative_audio_path(audio, &working_dir)));
        args.push(EncoderArg::plain("-oac"));
        args.push(EncoderArg::plain("copy"));
    } else if !params.is_sequence() && params.video_count() == 1 && params.avi_has_audio {
        args.push(EncoderArg::plain("-oac"));
        args.push(EncoderArg::plain("copy"));
    }

    let mut dialog_suffix = || {
        if codec_settings.show_dialog && !ctx.dialog_shown(params.monochrome) {
            ctx.mark_dialog_shown(params.monochrome);
            ":compdata=dialog"
        } else {
            ""
        }
    };

    match codec {
        VideoCodec::Copy => {
            args.push(EncoderArg::plain("-ovc"));
            args.push(EncoderArg::plain("copy"));
        }
        VideoCodec::Raw => {
            args.push(EncoderArg::plain("-ovc"));
            args.push(EncoderArg::plain("raw"));
        }
        VideoCodec::Lagarith => {
            args.push(EncoderArg::plain("-ovc"));
            args.push(EncoderArg::plain("vfw"));
            args.push(EncoderArg::plain("-xvfwopts"));
            args.push(EncoderArg::plain(format!(
                "codec=LAGARITH.DLL{}",
                dialog_suffix()
            )));
        }
        VideoCodec::Lavc => {
            args.push(EncoderArg::plain("-ovc"));
            args.push(EncoderArg::plain("lavc"));
            if !codec_settings.lavc_options.trim().is_empty() {
                args.push(EncoderArg::plain("-lavcopts"));
                args.push(EncoderArg::plain(codec_settings.lavc_options.clone()));
            }
        }
        VideoCodec::CustomVfw => {
            args.push(EncoderArg::plain("-ovc"));
            args.push(EncoderArg::plain("vfw"));
            args.push(EncoderArg::plain("-xvfwopts"));
            args.push(EncoderArg::plain(format!(
                "codec={}{}",
                codec_settings.vfw_codec_name,
                dialog_suffix()
            )));
        }
    }

    if params.is_sequence() && output_rate != input_rate {
        args.push(EncoderArg::plain("-ofps"));
        args.push(EncoderArg::plain(format_rate(output_rate)));
    }

    args.push(EncoderArg::plain("-of"));
    args.push(EncoderArg::plain("avi"));
    args.push(EncoderArg::plain("-o"));
    args.push(EncoderArg::path(
        params.output_path.to_string_lossy().to_string(),
    ));

    EncoderInvocation {
        working_dir,
        args,
        warnings,
    }
}

fn absolute_or_self(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The bare file name when `audio` sits in `working_dir`, the full path otherwise.
fn relative_audio_path(audio: &Path, working_dir: &Path) -> String {
    let full = absolute_or_self(audio);
    if let Some(name) = audio.file_name() {
        let in_working_dir = absolute_or_self(&working_dir.join(name));
        let same = full.to_string_lossy().to_lowercase()
            == in_working_dir.to_string_lossy().to_lowercase();
        if same {
            return name.to_string_lossy().to_string();
        }
    }
    full.to_string_lossy().to_string()
}
