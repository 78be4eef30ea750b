//! Parsing of the encoder's textual progress output.
//!
//! The encoder rewrites a status line on stdout, e.g.
//! `Pos:   1.2s     72f (12%) 143.25fps Trem:   0min   3mb`.
//! Output is read in raw chunks, so one chunk may hold several partial
//! status lines; only the first match of each pattern is used.

use regex::Regex;

/// One value pulled out of an encoder output chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncoderEvent {
    /// Percentage of the current invocation, 0 to 100.
    Progress(u32),
    /// Current encoding speed.
    FrameRate(f64),
    /// Index of the frame being processed.
    FrameIndex(u64),
}

/// Matches the three progress shapes in encoder stdout.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    percent: Regex,
    frame_rate: Regex,
    frame_index: Regex,
}

impl ProgressParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            percent: Regex::new(r"\( ?(\d+)%\)")?,
            frame_rate: Regex::new(r"(\d+)\.(\d+)fps")?,
            frame_index: Regex::new(r"(\d+)f")?,
        })
    }

    /// Events found in `chunk`, in the order progress, frame rate, frame index.
    pub fn parse(&self, chunk: &str) -> Vec<EncoderEvent> {
        let mut events = Vec::with_capacity(3);

        if let Some(caps) = self.percent.captures(chunk) {
            if let Ok(percent) = caps[1].parse::<u32>() {
                events.push(EncoderEvent::Progress(percent));
            }
        }

        if let Some(caps) = self.frame_rate.captures(chunk) {
            if let Ok(fps) = format!("{}.{}", &caps[1], &caps[2]).parse::<f64>() {
                events.push(EncoderEvent::FrameRate(fps));
            }
        }

        if let Some(caps) = self.frame_index.captures(chunk) {
            if let Ok(index) = caps[1].parse::<u64>() {
                events.push(EncoderEvent::FrameIndex(index));
            }
        }

        events
    }
}
