//! Minimal RIFF/AVI container reader.
//!
//! Only the header list is walked: enough to tell whether a file is a
//! usable AVI, how many video and audio streams it declares and how many
//! frames the main header reports. Stream data is never touched.

mod reader;

pub use reader::parse_avi;

#[cfg(test)]
pub(crate) use reader::test_support;
