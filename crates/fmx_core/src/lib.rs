//! FrameMux Core - job analysis and encoder orchestration
//!
//! This crate contains all business logic with zero UI dependencies:
//! AVI container inspection, image-sequence grouping, the encode job
//! variants, encoder argument building, process supervision and the batch
//! orchestrator. It can be used by a GUI application or the CLI tool.

pub mod avi;
pub mod config;
pub mod encoder;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod sequence;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
