//! FrameMux command-line front end.
//!
//! Turns files and folders into encode jobs, then runs the batch, writes it
//! out as a `cmd` script, or lists what was found. `config` shows and edits
//! the settings file.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fmx_core::config::{ConfigManager, ConfigSection, Settings};
use fmx_core::encoder::{BatchScript, ProcessRunner};
use fmx_core::jobs::{discover_jobs, EncodeJob, JobQueue};
use fmx_core::logging::{self, BatchLog, LogCallback, LogConfig};
use fmx_core::models::JobStatus;
use fmx_core::orchestrator::{
    format_duration, spawn_batch, BatchOrchestrator, BatchRunContext, ProgressClock, ProgressSink,
};

/// How often the status line is refreshed while a batch runs.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "framemux", version)]
#[command(about = "Batch-mux captured AVI files and image sequences through mencoder")]
struct Cli {
    /// Settings file, created with defaults when missing
    #[arg(short, long, global = true, default_value = "framemux.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode every job found in the given files and folders
    Run {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Write the batch as a Windows cmd script instead of running it
    Export {
        /// Script file to write
        #[arg(short, long)]
        script: PathBuf,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List the jobs found in the given files and folders
    Analyze {
        /// Print the job list as JSON
        #[arg(long)]
        json: bool,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the settings file, or change the encoder or output folder in it
    Config {
        /// Path to the mencoder executable
        #[arg(long)]
        encoder: Option<String>,

        /// Write every output into this folder (empty string turns it off)
        #[arg(long)]
        output_folder: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    let settings = config.snapshot();

    let _guard = match config.logs_folder() {
        Some(dir) => Some(logging::init_tracing_with_file(settings.logging.level, &dir)),
        None => {
            logging::init_tracing(settings.logging.level);
            None
        }
    };
    tracing::debug!("Using settings from {}", config.path().display());

    match cli.command {
        Command::Run { paths } => {
            let log = open_batch_log(&config, &settings)?;
            run_batch(settings, log, &paths)
        }
        Command::Export { script, paths } => {
            let log = BatchLog::new(log_config(&settings), Some(stderr_callback()));
            export_batch(&settings, &log, &paths, &script)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Analyze { json, paths } => {
            let log = BatchLog::new(log_config(&settings), Some(stderr_callback()));
            analyze(&settings, &log, &paths, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config {
            encoder,
            output_folder,
        } => {
            update_config(&mut config, encoder, output_folder)?;
            show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Apply command-line edits, rewriting only the sections that changed.
fn update_config(
    config: &mut ConfigManager,
    encoder: Option<String>,
    output_folder: Option<String>,
) -> Result<()> {
    if let Some(path) = encoder {
        config.settings_mut().encoder.encoder_path = path;
        config
            .update_section(ConfigSection::Encoder)
            .context("saving encoder settings")?;
    }
    if let Some(folder) = output_folder {
        let output = &mut config.settings_mut().output;
        output.same_folder_for_all = !folder.trim().is_empty();
        output.output_folder = folder;
        config
            .update_section(ConfigSection::Output)
            .context("saving output settings")?;
    }
    Ok(())
}

fn show_config(config: &ConfigManager) {
    let settings = config.settings();
    println!("settings file   {}", config.path().display());
    println!("encoder         {}", settings.encoder.encoder_path);
    let output = if settings.output.same_folder_for_all {
        settings.output.output_folder.as_str()
    } else {
        "(next to each input)"
    };
    println!("output folder   {}", output);
    match config.logs_folder() {
        Some(dir) => println!("log folder      {}", dir.display()),
        None => println!("log folder      (off)"),
    }
}

fn log_config(settings: &Settings) -> LogConfig {
    LogConfig {
        level: settings.logging.level,
        tail_lines: settings.logging.tail_lines,
        show_timestamps: true,
    }
}

fn stderr_callback() -> LogCallback {
    Box::new(|line: &str| eprintln!("{}", line))
}

fn open_batch_log(config: &ConfigManager, settings: &Settings) -> Result<BatchLog> {
    match config.logs_folder() {
        Some(dir) => BatchLog::with_file(&dir, log_config(settings), Some(stderr_callback()))
            .with_context(|| format!("opening batch log in {}", dir.display())),
        None => Ok(BatchLog::new(log_config(settings), Some(stderr_callback()))),
    }
}

fn discover(paths: &[PathBuf], settings: &Settings, log: &BatchLog) -> Result<Vec<EncodeJob>> {
    let jobs = discover_jobs(paths, settings, log);
    if jobs.is_empty() {
        bail!("no valid input among {} path(s)", paths.len());
    }
    Ok(jobs)
}

fn run_batch(settings: Settings, log: BatchLog, paths: &[PathBuf]) -> Result<ExitCode> {
    // Refuse to start anything without a usable encoder.
    let runner = ProcessRunner::new(&settings.encoder)?;

    let mut queue = JobQueue::new();
    queue.add_all(discover(paths, &settings, &log)?);
    let total_frames = queue.total_frames();

    let log = Arc::new(log);
    let sink = Arc::new(ConsoleSink::default());
    let orchestrator = BatchOrchestrator::new(settings, Arc::clone(&log), sink.clone());

    let clock = ProgressClock::start();
    let handle = spawn_batch(orchestrator, queue, Box::new(runner))
        .context("starting the batch worker")?;

    while !handle.is_finished() {
        thread::sleep(STATUS_INTERVAL);
        sink.print_status(&clock, total_frames);
    }

    let (queue, summary) = handle.join()?;
    for job in queue.jobs() {
        println!("{:<9} {}", job.status.as_str(), job.name);
    }
    eprintln!(
        "Done in {}: {} succeeded, {} failed, {} skipped",
        format_duration(clock.elapsed()),
        summary.succeeded,
        summary.failed,
        summary.skipped
    );

    Ok(if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn export_batch(
    settings: &Settings,
    log: &BatchLog,
    paths: &[PathBuf],
    script_path: &Path,
) -> Result<()> {
    let jobs = discover(paths, settings, log)?;

    let file = File::create(script_path)
        .with_context(|| format!("creating {}", script_path.display()))?;
    let mut script = BatchScript::new(BufWriter::new(file), settings.encoder.encoder_path.clone());

    let mut ctx = BatchRunContext::new();
    for job in &jobs {
        job.export(settings, &mut ctx, log, &mut script)
            .with_context(|| format!("writing job '{}'", job.name()))?;
    }
    script.flush()?;

    log.info(&format!(
        "Wrote {} job(s) to {}",
        jobs.len(),
        script_path.display()
    ));
    Ok(())
}

fn analyze(settings: &Settings, log: &BatchLog, paths: &[PathBuf], json: bool) -> Result<()> {
    let mut queue = JobQueue::new();
    queue.add_all(discover(paths, settings, log)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&queue.summaries())?);
        return Ok(());
    }

    for summary in queue.summaries() {
        println!(
            "{:<15} {:>8} frames  {} video(s){}  {}",
            summary.kind,
            summary.frame_count,
            summary.video_count,
            if summary.has_audio { " + audio" } else { "" },
            summary.name
        );
    }
    println!("{} job(s), {} frames", queue.len(), queue.total_frames());
    Ok(())
}

/// Keeps the latest progress values for the status line.
#[derive(Default)]
struct ConsoleSink {
    percent: AtomicU64,
    frame_rate: AtomicU64,
    frame_index: AtomicU64,
}

impl ConsoleSink {
    fn overall_percent(&self) -> f64 {
        f64::from_bits(self.percent.load(Ordering::Relaxed))
    }

    fn print_status(&self, clock: &ProgressClock, total_frames: u64) {
        let percent = self.overall_percent();
        let frames_done = total_frames as f64 * percent / 100.0;
        let Some(reading) = clock.read(percent, frames_done) else {
            return;
        };

        let remaining = reading
            .remaining
            .map(format_duration)
            .unwrap_or_else(|| "N/A".to_string());
        let average = reading
            .average_fps
            .map(|fps| format!("{:.1} FPS", fps))
            .unwrap_or_else(|| "N/A".to_string());
        let current_fps = f64::from_bits(self.frame_rate.load(Ordering::Relaxed));
        let current = if current_fps >= 0.1 {
            format!("{:.1} FPS", current_fps)
        } else {
            "N/A".to_string()
        };
        let frame = match self.frame_index.load(Ordering::Relaxed) {
            0 => "N/A".to_string(),
            n => n.to_string(),
        };

        eprintln!(
            "[{:5.1}%] elapsed {} | remaining {} | average {} | current {} | frame {}",
            percent,
            format_duration(reading.elapsed),
            remaining,
            average,
            current,
            frame
        );
    }
}

impl ProgressSink for ConsoleSink {
    fn set_overall_progress(&self, percent: f64) {
        self.percent.store(percent.to_bits(), Ordering::Relaxed);
    }

    fn set_current_frame_rate(&self, fps: f64) {
        self.frame_rate.store(fps.to_bits(), Ordering::Relaxed);
    }

    fn set_current_frame_index(&self, index: u64) {
        self.frame_index.store(index, Ordering::Relaxed);
    }

    fn set_job_started(&self, index: usize, name: &str) {
        self.frame_rate.store(0, Ordering::Relaxed);
        self.frame_index.store(0, Ordering::Relaxed);
        eprintln!("Job {}: {}", index + 1, name);
    }

    fn set_job_status(&self, index: usize, status: JobStatus) {
        tracing::debug!("Job {} is now {}", index + 1, status.as_str());
    }
}
