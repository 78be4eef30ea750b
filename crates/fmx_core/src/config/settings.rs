//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.
//! A batch run works on a cloned snapshot, so edits made while a batch is
//! encoding only apply to the next run.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::{ChannelKind, FileNamingPolicy, SequenceNaming, VideoCodec};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Encoder executable and timing settings.
    #[serde(default)]
    pub encoder: EncoderSettings,

    /// Codec used for colour content.
    #[serde(default = "CodecSettings::color_default")]
    pub color_codec: CodecSettings,

    /// Codec used for single-channel (depth/stencil) content.
    #[serde(default = "CodecSettings::monochrome_default")]
    pub monochrome_codec: CodecSettings,

    /// Output location and naming.
    #[serde(default)]
    pub output: OutputSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            encoder: EncoderSettings::default(),
            color_codec: CodecSettings::color_default(),
            monochrome_codec: CodecSettings::monochrome_default(),
            output: OutputSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Codec settings for the given channel kind.
    pub fn codec_for(&self, channel: ChannelKind) -> &CodecSettings {
        if channel.is_monochrome() {
            &self.monochrome_codec
        } else {
            &self.color_codec
        }
    }
}

/// External encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Path to the encoder executable (bare names are looked up on PATH).
    #[serde(default = "default_encoder_path")]
    pub encoder_path: String,

    /// Input frame rate for AVI inputs and image sequences.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Output frame rate; also the base of the skip offset.
    #[serde(default = "default_frame_rate")]
    pub output_frame_rate: f64,

    /// Frames dropped from the start of every output.
    #[serde(default = "default_frames_to_skip")]
    pub frames_to_skip: u32,

    /// Log the encoder's error output after each run.
    #[serde(default = "default_true")]
    pub display_stderr: bool,

    /// Delay after launch before waiting on the encoder.
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Delay between two reads of the encoder's progress output.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

fn default_encoder_path() -> String {
    "mencoder".to_string()
}

fn default_frame_rate() -> f64 {
    60.0
}

fn default_frames_to_skip() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_warmup_ms() -> u64 {
    1000
}

fn default_refresh_interval_ms() -> u64 {
    50
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            encoder_path: default_encoder_path(),
            frame_rate: default_frame_rate(),
            output_frame_rate: default_frame_rate(),
            frames_to_skip: default_frames_to_skip(),
            display_stderr: true,
            warmup_ms: default_warmup_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

/// Codec selection for one channel kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSettings {
    /// Selected codec.
    #[serde(default)]
    pub codec: VideoCodec,

    /// Free-form option string for the library codec.
    #[serde(default)]
    pub lavc_options: String,

    /// System codec name for the custom VFW codec.
    #[serde(default)]
    pub vfw_codec_name: String,

    /// Show the codec's configuration dialog once per batch.
    #[serde(default)]
    pub show_dialog: bool,
}

fn default_lavc_options() -> String {
    "vcodec=ffv1".to_string()
}

impl CodecSettings {
    /// Lossless codec for colour content.
    pub fn color_default() -> Self {
        Self {
            codec: VideoCodec::Lagarith,
            lavc_options: default_lavc_options(),
            vfw_codec_name: String::new(),
            show_dialog: false,
        }
    }

    /// Uncompressed output for single-channel content.
    pub fn monochrome_default() -> Self {
        Self {
            codec: VideoCodec::Raw,
            lavc_options: default_lavc_options(),
            vfw_codec_name: String::new(),
            show_dialog: false,
        }
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self::color_default()
    }
}

/// Output folder and file naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Write every output into `output_folder`.
    #[serde(default)]
    pub same_folder_for_all: bool,

    /// Shared output folder.
    #[serde(default)]
    pub output_folder: String,

    /// Naming rule for single AVI inputs.
    #[serde(default)]
    pub naming_policy: FileNamingPolicy,

    /// Prefix for `AddPrefix`.
    #[serde(default)]
    pub prefix: String,

    /// Suffix for `AddSuffix`.
    #[serde(default)]
    pub suffix: String,

    /// Match expression for `ApplyRegex`.
    #[serde(default = "default_regex_match")]
    pub regex_match: String,

    /// Replacement for `ApplyRegex`.
    #[serde(default = "default_regex_replacement")]
    pub regex_replacement: String,

    /// Naming rule for image sequences.
    #[serde(default)]
    pub sequence_naming: SequenceNaming,
}

fn default_regex_match() -> String {
    r"(.+)\.(.+)".to_string()
}

fn default_regex_replacement() -> String {
    "${1}_lag.avi".to_string()
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            same_folder_for_all: false,
            output_folder: String::new(),
            naming_policy: FileNamingPolicy::default(),
            prefix: String::new(),
            suffix: String::new(),
            regex_match: default_regex_match(),
            regex_replacement: default_regex_replacement(),
            sequence_naming: SequenceNaming::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for the console and the batch log.
    #[serde(default)]
    pub level: LogLevel,

    /// Folder for log files (empty disables file logging).
    #[serde(default = "default_log_folder")]
    pub log_folder: String,

    /// Number of recent lines kept for display after a failure.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

fn default_log_folder() -> String {
    ".logs".to_string()
}

fn default_tail_lines() -> usize {
    50
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            log_folder: default_log_folder(),
            tail_lines: default_tail_lines(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Encoder,
    ColorCodec,
    MonochromeCodec,
    Output,
    Logging,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Encoder,
        ConfigSection::ColorCodec,
        ConfigSection::MonochromeCodec,
        ConfigSection::Output,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Encoder => "encoder",
            ConfigSection::ColorCodec => "color_codec",
            ConfigSection::MonochromeCodec => "monochrome_codec",
            ConfigSection::Output => "output",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment line written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Encoder => "External encoder and frame rates",
            ConfigSection::ColorCodec => "Codec for colour content",
            ConfigSection::MonochromeCodec => "Codec for depth/stencil content",
            ConfigSection::Output => "Output folder and file naming",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[encoder]"));
        assert!(toml.contains("[color_codec]"));
        assert!(toml.contains("encoder_path"));
    }

    #[test]
    fn defaults_match_capture_workflow() {
        let settings = Settings::default();
        assert_eq!(settings.encoder.frames_to_skip, 2);
        assert_eq!(settings.encoder.frame_rate, 60.0);
        assert_eq!(settings.color_codec.codec, VideoCodec::Lagarith);
        assert_eq!(settings.monochrome_codec.codec, VideoCodec::Raw);
        assert_eq!(settings.color_codec.lavc_options, "vcodec=ffv1");
        assert_eq!(settings.output.regex_replacement, "${1}_lag.avi");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[encoder]\nframe_rate = 30.0\n";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.encoder.frame_rate, 30.0);
        assert_eq!(parsed.encoder.output_frame_rate, 60.0);
        assert_eq!(parsed.monochrome_codec.codec, VideoCodec::Raw);
        assert_eq!(parsed.logging.tail_lines, 50);
    }

    #[test]
    fn codec_for_channel() {
        let settings = Settings::default();
        assert_eq!(settings.codec_for(ChannelKind::Depth).codec, VideoCodec::Raw);
        assert_eq!(settings.codec_for(ChannelKind::Colour).codec, VideoCodec::Lagarith);
    }
}
