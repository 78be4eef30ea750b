//! External encoder integration.
//!
//! - [`build_invocation`] maps settings and one sub-job's parameters to an
//!   argument list, never failing (problems become warnings)
//! - [`ProcessRunner`] starts the encoder and streams its progress
//! - [`BatchScript`] writes invocations out as a script instead
//!
//! The [`EncodeExecutor`] trait is the seam between jobs and the process, so
//! job and batch logic can be exercised without a real encoder.

mod args;
mod errors;
mod export;
mod invocation;
mod progress;
mod runner;

pub use args::{build_invocation, format_rate, EncodeInput, EncodeParams};
pub use errors::{EncodeError, EncodeResult};
pub use export::BatchScript;
pub use invocation::{EncoderArg, EncoderInvocation};
pub use progress::{EncoderEvent, ProgressParser};
pub use runner::{hidden_command, resolve_encoder_path, EncodeExecutor, ProcessRunner, RunReport};
