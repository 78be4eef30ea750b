//! Elapsed/remaining time and average speed for a running batch.
//!
//! The clock is display-only: it is polled on any interval and has no effect
//! on the encode itself.

use std::time::{Duration, Instant};

/// Readings are unknown until the batch has run this long.
const MIN_ELAPSED: Duration = Duration::from_millis(100);

/// Slowest average speed worth showing.
const MIN_FPS: f64 = 0.1;

/// One poll of the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    pub elapsed: Duration,
    pub remaining: Option<Duration>,
    /// Average frames per second over the whole batch.
    pub average_fps: Option<f64>,
}

/// Batch stopwatch.
#[derive(Debug, Clone, Copy)]
pub struct ProgressClock {
    started: Instant,
}

impl ProgressClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Read the clock given the overall percent and frames done so far.
    ///
    /// Returns `None` during the first 100 ms.
    pub fn read(&self, overall_percent: f64, frames_done: f64) -> Option<ClockReading> {
        Self::reading_at(self.elapsed(), overall_percent, frames_done)
    }

    /// Reading for an explicit elapsed time.
    pub fn reading_at(
        elapsed: Duration,
        overall_percent: f64,
        frames_done: f64,
    ) -> Option<ClockReading> {
        if elapsed < MIN_ELAPSED {
            return None;
        }

        let seconds = elapsed.as_secs_f64();
        let progress = overall_percent / 100.0;

        let remaining = if progress > 0.0 && progress.is_finite() {
            let total = seconds / progress;
            Duration::try_from_secs_f64((total - seconds).max(0.0)).ok()
        } else {
            None
        };

        let fps = frames_done / seconds;
        let average_fps = (fps.is_finite() && fps >= MIN_FPS).then_some(fps);

        Some(ClockReading {
            elapsed,
            remaining,
            average_fps,
        })
    }
}

/// Render a duration as `01h 02m 03s`, `02m 03s` or `3s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{:02}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{:02}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_before_warmup() {
        assert!(ProgressClock::reading_at(Duration::from_millis(50), 10.0, 100.0).is_none());
    }

    #[test]
    fn remaining_scales_with_progress() {
        let reading = ProgressClock::reading_at(Duration::from_secs(30), 25.0, 600.0).unwrap();
        assert_eq!(reading.remaining, Some(Duration::from_secs(90)));
        assert_eq!(reading.average_fps, Some(20.0));
    }

    #[test]
    fn no_progress_means_unknown_remaining() {
        let reading = ProgressClock::reading_at(Duration::from_secs(5), 0.0, 0.0).unwrap();
        assert_eq!(reading.remaining, None);
        assert_eq!(reading.average_fps, None);
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_secs(7)), "7s");
        assert_eq!(format_duration(Duration::from_secs(125)), "02m 05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "01h 02m 03s");
    }
}
