//! Configuration management for FrameMux.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use fmx_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("framemux.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Encoder: {}", config.settings().encoder.encoder_path);
//!
//! config.settings_mut().encoder.frames_to_skip = 0;
//! config.update_section(ConfigSection::Encoder).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    CodecSettings, ConfigSection, EncoderSettings, LoggingSettings, OutputSettings, Settings,
};
