//! Data models for FrameMux.
//!
//! This module contains the core data structures shared across modules:
//! - Enums for codecs, naming policies, channel kinds and job status
//! - Media structures (AVI stream info, image sequences)

mod enums;
mod media;

pub use enums::{ChannelKind, FileNamingPolicy, JobStatus, SequenceNaming, VideoCodec};
pub use media::{AviStreamInfo, ImageSequence};
