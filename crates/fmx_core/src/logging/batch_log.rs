//! Batch log with file and callback output.
//!
//! One log covers a whole batch run. Every line:
//! - is written to the batch log file (when one was opened)
//! - is sent to the display callback (when one was given)
//! - is kept in a bounded tail buffer for display after a failure

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Log shared by the orchestrator thread and the display layer.
pub struct BatchLog {
    log_path: Option<PathBuf>,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Mutex<Option<LogCallback>>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
}

impl BatchLog {
    /// Create a log without a file.
    pub fn new(config: LogConfig, callback: Option<LogCallback>) -> Self {
        Self {
            log_path: None,
            file_writer: Mutex::new(None),
            callback: Mutex::new(callback),
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.tail_lines)),
            config,
        }
    }

    /// Create a log that also writes `batch_<timestamp>.log` in `log_dir`.
    pub fn with_file(
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let file_name = format!("batch_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
        let log_path = log_dir.join(file_name);
        let file = File::create(&log_path)?;

        let mut log = Self::new(config, callback);
        log.log_path = Some(log_path);
        *log.file_writer.get_mut() = Some(BufWriter::new(file));
        Ok(log)
    }

    /// Get the log file path, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Replace the display callback.
    pub fn set_callback(&self, callback: Option<LogCallback>) {
        *self.callback.lock() = callback;
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        let formatted = self.format_message(message);
        self.push_tail(&formatted);
        self.output(&formatted);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log an encoder command line.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// Log accumulated encoder error output, one warning per non-blank line.
    pub fn encoder_output(&self, text: &str) {
        for line in text.split(|c: char| c == '\r' || c == '\n') {
            if line.trim().is_empty() {
                continue;
            }
            self.warn(&MessagePrefix::EncoderOutput.format(line));
        }
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Clear the tail buffer.
    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn push_tail(&self, line: &str) {
        if self.config.tail_lines == 0 {
            return;
        }
        let mut buffer = self.tail_buffer.lock();
        if buffer.len() >= self.config.tail_lines {
            buffer.pop_front();
        }
        buffer.push_back(line.to_string());
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for BatchLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn plain_config() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let log = BatchLog::with_file(dir.path(), LogConfig::default(), None).unwrap();

        log.info("Processing 'clip.avi'");
        log.flush();

        let path = log.log_path().unwrap().to_path_buf();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("batch_"));
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("Processing 'clip.avi'"));
    }

    #[test]
    fn calls_callback_per_line() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let callback: LogCallback = Box::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let log = BatchLog::new(plain_config(), Some(callback));
        log.info("one");
        log.warn("two");
        log.debug("filtered");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn encoder_output_skips_blank_lines() {
        let log = BatchLog::new(plain_config(), None);
        log.encoder_output("first\r\n\r\n   \nsecond\n");

        assert_eq!(
            log.get_tail(),
            vec!["[WARNING] > first".to_string(), "[WARNING] > second".to_string()]
        );
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let config = LogConfig {
            tail_lines: 3,
            show_timestamps: false,
            ..LogConfig::default()
        };
        let log = BatchLog::new(config, None);
        for i in 0..6 {
            log.info(&format!("Line {}", i));
        }

        assert_eq!(log.get_tail(), vec!["Line 3", "Line 4", "Line 5"]);
        log.clear_tail();
        assert!(log.get_tail().is_empty());
    }

    #[test]
    fn command_lines_are_prefixed() {
        let log = BatchLog::new(plain_config(), None);
        log.command("\"mencoder\" -ovc raw");
        assert_eq!(log.get_tail(), vec!["$ \"mencoder\" -ovc raw"]);
    }
}
