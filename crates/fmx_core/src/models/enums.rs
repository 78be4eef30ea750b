//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Video codec handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    /// Uncompressed frames.
    Raw,
    /// Stream copy (no re-encode).
    Copy,
    /// Lossless intra-frame codec through the system codec interface.
    #[default]
    Lagarith,
    /// Library codec driven by a free-form option string.
    Lavc,
    /// Named system codec.
    CustomVfw,
}

impl VideoCodec {
    /// Whether this codec can pop up its configuration dialog.
    pub fn supports_dialog(&self) -> bool {
        matches!(self, VideoCodec::Lagarith | VideoCodec::CustomVfw)
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoCodec::Raw => write!(f, "raw"),
            VideoCodec::Copy => write!(f, "copy"),
            VideoCodec::Lagarith => write!(f, "lagarith"),
            VideoCodec::Lavc => write!(f, "lavc"),
            VideoCodec::CustomVfw => write!(f, "custom vfw"),
        }
    }
}

/// Rule for deriving an output file name from a source file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileNamingPolicy {
    /// Keep the source name.
    #[default]
    NoChange,
    /// Prepend the configured prefix.
    AddPrefix,
    /// Insert the configured suffix before the extension.
    AddSuffix,
    /// Apply the configured match/replacement regex pair.
    ApplyRegex,
}

/// How image-sequence outputs are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SequenceNaming {
    /// Use the parent directory's name.
    #[default]
    FolderName,
    /// Use the sequence's own (first) file name.
    ImageName,
}

/// Classification of an image sequence's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Plain colour sequence in a loose folder.
    #[default]
    Normal,
    /// Colour channel of a captured cut.
    Colour,
    /// Depth data (single channel).
    Depth,
    /// Stencil data (single channel).
    Stencil,
}

impl ChannelKind {
    /// Single-channel data is encoded with the monochrome codec and never gets audio.
    pub fn is_monochrome(&self) -> bool {
        matches!(self, ChannelKind::Depth | ChannelKind::Stencil)
    }

    /// Classify a sequence from its first file name.
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains(".depth.") {
            ChannelKind::Depth
        } else if lower.contains(".stencil.") {
            ChannelKind::Stencil
        } else {
            ChannelKind::Normal
        }
    }

    /// Name suffix used in output file names (".depth", ".stencil").
    pub fn name_suffix(&self) -> Option<&'static str> {
        match self {
            ChannelKind::Depth => Some(".depth"),
            ChannelKind::Stencil => Some(".stencil"),
            ChannelKind::Normal | ChannelKind::Colour => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Normal => write!(f, "normal"),
            ChannelKind::Colour => write!(f, "colour"),
            ChannelKind::Depth => write!(f, "depth"),
            ChannelKind::Stencil => write!(f, "stencil"),
        }
    }
}

/// Status of a job in the batch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, not started in the current batch.
    #[default]
    Waiting,
    /// Currently being encoded.
    Encoding,
    /// Finished without a launch failure.
    Success,
    /// The encoder could not be started.
    Failure,
}

impl JobStatus {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Waiting => "waiting",
            JobStatus::Encoding => "encoding",
            JobStatus::Success => "success",
            JobStatus::Failure => "failure",
        }
    }
}
