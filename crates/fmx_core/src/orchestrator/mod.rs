//! Batch orchestration.
//!
//! This module provides:
//! - `BatchOrchestrator`: runs a job queue sequentially on one worker thread
//! - `BatchRunContext`: per-batch state threaded into argument building
//! - `BatchState`: frame-weighted workload accounting
//! - `CancelHandle`: cooperative, job-granular cancellation
//! - `ProgressSink`: notifications for the display layer
//! - `ProgressClock`: elapsed/remaining time and average speed

mod batch;
mod cancel;
mod clock;
mod context;
mod errors;
mod sink;
mod state;

pub use batch::{spawn_batch, BatchHandle, BatchOrchestrator, BatchSummary};
pub use cancel::CancelHandle;
pub use clock::{format_duration, ClockReading, ProgressClock};
pub use context::BatchRunContext;
pub use errors::{BatchError, BatchResult};
pub use sink::{NullSink, ProgressSink};
pub use state::BatchState;
