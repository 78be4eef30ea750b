//! Media-related types: AVI stream info and image sequences.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::ChannelKind;

/// Stream layout of one AVI file, as read from its container headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AviStreamInfo {
    /// True once at least one stream header was parsed.
    pub is_valid: bool,
    /// Number of `vids` stream headers.
    pub video_stream_count: u32,
    /// Number of `auds` stream headers.
    pub audio_stream_count: u32,
    /// Declared total frames from the main header, -1 when unknown.
    pub frame_count: i64,
}

impl Default for AviStreamInfo {
    fn default() -> Self {
        Self::invalid()
    }
}

impl AviStreamInfo {
    /// Info for a file that is not a readable AVI container.
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            video_stream_count: 0,
            audio_stream_count: 0,
            frame_count: -1,
        }
    }

    /// Whether the file carries at least one audio stream.
    pub fn has_audio(&self) -> bool {
        self.audio_stream_count > 0
    }

    /// Frame count usable as workload (unknown counts as zero).
    pub fn workload(&self) -> u64 {
        self.frame_count.max(0) as u64
    }
}

/// A run of numbered image files encoded as one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSequence {
    /// Files in sequence order (always two or more).
    pub file_paths: Vec<PathBuf>,
    /// Wildcard pattern handed to the encoder, e.g. `shot_*.tga`.
    pub pattern: String,
    /// Regex describing the shared non-digit structure of the names.
    pub skeleton: String,
    /// Content classification.
    pub channel: ChannelKind,
    /// Output file name (no directory).
    pub output_name: String,
    /// Set when the name fell back to the generic rule and the sequence
    /// could take the bare folder name if it is the only one doing so.
    pub wants_simple_name: bool,
}

impl ImageSequence {
    /// Number of frames (one per file).
    pub fn frame_count(&self) -> u64 {
        self.file_paths.len() as u64
    }

    /// Single-channel sequences use the monochrome codec and never get audio.
    pub fn is_monochrome(&self) -> bool {
        self.channel.is_monochrome()
    }
}
