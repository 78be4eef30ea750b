//! One encoder launch: working directory plus argument list.

use std::path::PathBuf;

/// A single command-line argument.
///
/// Path arguments are rendered inside double quotes in the exported
/// command line; the process itself receives the bare value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderArg {
    pub value: String,
    pub quoted: bool,
}

impl EncoderArg {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }

    pub fn path(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    fn render(&self) -> String {
        if self.quoted {
            format!("\"{}\"", self.value)
        } else {
            self.value.clone()
        }
    }
}

/// Everything needed to start the encoder once.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderInvocation {
    /// Directory the encoder runs in (absolute).
    pub working_dir: PathBuf,
    /// Arguments in order.
    pub args: Vec<EncoderArg>,
    /// Precondition problems found while building the arguments.
    pub warnings: Vec<String>,
}

impl EncoderInvocation {
    /// Bare argument values, as handed to the process.
    pub fn arg_values(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.value.as_str()).collect()
    }

    /// Arguments joined into one line with path arguments quoted.
    pub fn command_line(&self) -> String {
        self.args
            .iter()
            .map(EncoderArg::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
