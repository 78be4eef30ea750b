//! Encoder process supervision.
//!
//! [`ProcessRunner`] starts the encoder with both output streams piped and no
//! console window, then reads them on two threads:
//! - stdout is read in raw chunks, parsed into [`EncoderEvent`]s and sent
//!   over a channel that the calling thread drains
//! - stderr chunks are collected (when enabled) for display after the run
//!
//! Both readers are joined before [`EncodeExecutor::run`] returns.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use crate::config::EncoderSettings;

use super::errors::{EncodeError, EncodeResult};
use super::invocation::EncoderInvocation;
use super::progress::{EncoderEvent, ProgressParser};

/// Windows flag to prevent child processes from creating visible console windows.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

const READ_CHUNK_SIZE: usize = 4096;

/// Outcome of one encoder run that did start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Accumulated stderr text (empty unless capture is enabled).
    pub stderr_output: String,
}

/// Runs one encoder invocation to completion.
///
/// Implementations forward parsed progress through `events` while the
/// encoder runs. An `Err` means the encoder could not be run at all; a
/// started encoder always yields a [`RunReport`].
pub trait EncodeExecutor {
    fn run(
        &mut self,
        invocation: &EncoderInvocation,
        events: &mut dyn FnMut(EncoderEvent),
    ) -> EncodeResult<RunReport>;
}

/// Create a Command that won't spawn a visible console window on Windows.
pub fn hidden_command<S: AsRef<std::ffi::OsStr>>(program: S) -> Command {
    let mut cmd = Command::new(program);
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

/// Locate the encoder executable.
///
/// A path with a directory component must point at an existing file. A bare
/// name is looked up on `PATH`.
pub fn resolve_encoder_path(configured: &str) -> EncodeResult<PathBuf> {
    let configured = configured.trim();
    let not_found = || EncodeError::EncoderNotFound {
        path: configured.to_string(),
    };
    if configured.is_empty() {
        return Err(not_found());
    }

    let path = Path::new(configured);
    if path.is_absolute() || path.components().count() > 1 {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let search = std::env::var_os("PATH").ok_or_else(not_found)?;
    for dir in std::env::split_paths(&search) {
        let candidate = dir.join(configured);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if cfg!(windows) {
            let with_exe = dir.join(format!("{}.exe", configured));
            if with_exe.is_file() {
                return Ok(with_exe);
            }
        }
    }

    Err(not_found())
}

/// Production [`EncodeExecutor`] driving the external encoder.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    encoder_path: PathBuf,
    parser: Arc<ProgressParser>,
    warmup: Duration,
    refresh_interval: Duration,
    capture_stderr: bool,
}

impl ProcessRunner {
    /// Validate the configured encoder and prepare a runner.
    pub fn new(settings: &EncoderSettings) -> EncodeResult<Self> {
        let encoder_path = resolve_encoder_path(&settings.encoder_path)?;
        tracing::debug!("Using encoder at {}", encoder_path.display());

        Ok(Self {
            encoder_path,
            parser: Arc::new(ProgressParser::new()?),
            warmup: Duration::from_millis(settings.warmup_ms),
            refresh_interval: Duration::from_millis(settings.refresh_interval_ms),
            capture_stderr: settings.display_stderr,
        })
    }

    /// Resolved executable path.
    pub fn encoder_path(&self) -> &Path {
        &self.encoder_path
    }
}

impl EncodeExecutor for ProcessRunner {
    fn run(
        &mut self,
        invocation: &EncoderInvocation,
        events: &mut dyn FnMut(EncoderEvent),
    ) -> EncodeResult<RunReport> {
        let mut cmd = hidden_command(&self.encoder_path);
        cmd.args(invocation.arg_values())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("Running encoder: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!("Failed to start {}: {}", self.encoder_path.display(), e);
            EncodeError::launch_failed(&self.encoder_path, e)
        })?;

        let stdout = child.stdout.take().ok_or(EncodeError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(EncodeError::MissingPipe("stderr"))?;

        let (event_tx, event_rx) = mpsc::channel();
        let parser = Arc::clone(&self.parser);
        let refresh_interval = self.refresh_interval;
        let stdout_reader = thread::spawn(move || {
            read_chunks(stdout, |text| {
                for event in parser.parse(text) {
                    if event_tx.send(event).is_err() {
                        return false;
                    }
                }
                thread::sleep(refresh_interval);
                true
            });
        });

        let (stderr_tx, stderr_rx) = mpsc::channel();
        let capture_stderr = self.capture_stderr;
        let stderr_reader = thread::spawn(move || {
            read_chunks(stderr, |text| forward_stderr(&stderr_tx, capture_stderr, text));
        });

        thread::sleep(self.warmup);

        // Ends once the stdout reader drops its sender.
        for event in event_rx {
            events(event);
        }

        let status = child.wait().map_err(EncodeError::WaitFailed)?;

        stdout_reader
            .join()
            .map_err(|_| EncodeError::ReaderPanicked("stdout"))?;
        stderr_reader
            .join()
            .map_err(|_| EncodeError::ReaderPanicked("stderr"))?;

        let stderr_output: String = stderr_rx.try_iter().collect();

        tracing::debug!("Encoder exited with {:?}", status.code());

        Ok(RunReport {
            exit_code: status.code(),
            stderr_output,
        })
    }
}

/// Pass a stderr chunk on when capturing. Returns false once the receiving
/// side is gone so the reader stops draining.
fn forward_stderr(tx: &mpsc::Sender<String>, capture: bool, text: &str) -> bool {
    if capture {
        return tx.send(text.to_string()).is_ok();
    }
    true
}

/// Read `source` in fixed-size chunks until EOF, an error, or `on_chunk`
/// returning false.
fn read_chunks<R: Read>(mut source: R, mut on_chunk: impl FnMut(&str) -> bool) {
    let mut buffer = [0u8; READ_CHUNK_SIZE];
    loop {
        match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                let text = String::from_utf8_lossy(&buffer[..n]);
                if !on_chunk(&text) {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Encoder output read failed: {}", e);
                break;
            }
        }
    }
}
