//! Image-sequence grouping and output naming.
//!
//! A folder of loose image files is split into runs of names that share the
//! same non-digit structure ("shot_0001.tga", "shot_0002.tga", ...). Each run
//! of two or more files becomes an [`ImageSequence`](crate::models::ImageSequence)
//! with a wildcard pattern the encoder understands.

mod grouper;
pub mod naming;

pub use grouper::{group_sequences, sequence_pattern, sequence_skeleton};
pub use naming::{apply_naming_policy, resolve_simple_names, sequence_output_name};
