//! Batch script export.
//!
//! Instead of running the encoder, a batch can be written out as a Windows
//! `cmd` script for manual execution. Each invocation becomes:
//!
//! ```text
//! cd /D "C:\captures\demo"
//! "C:\tools\mencoder.exe" mf://shot_*.tga -mf fps=60 ... -of avi -o "C:\captures\demo.avi"
//! ```
//!
//! Two-pass jobs add a trailing `del "temp.avi"`; image renames needed
//! before an encode are written as `ren` lines.

use std::io::{self, Write};
use std::path::Path;

use super::invocation::EncoderInvocation;

const LINE_END: &str = "\r\n";

/// Writes encoder invocations as `cmd` script lines.
pub struct BatchScript<W: Write> {
    writer: W,
    encoder_path: String,
}

impl<W: Write> BatchScript<W> {
    pub fn new(writer: W, encoder_path: impl Into<String>) -> Self {
        Self {
            writer,
            encoder_path: encoder_path.into(),
        }
    }

    /// Directory change followed by the quoted encoder call.
    pub fn write_invocation(&mut self, invocation: &EncoderInvocation) -> io::Result<()> {
        write!(
            self.writer,
            "cd /D \"{}\"{}",
            invocation.working_dir.display(),
            LINE_END
        )?;
        write!(
            self.writer,
            "\"{}\" {}{}",
            self.encoder_path,
            invocation.command_line(),
            LINE_END
        )
    }

    /// Rename `from` to `new_name` in its own folder.
    pub fn write_rename(&mut self, from: &Path, new_name: &str) -> io::Result<()> {
        write!(
            self.writer,
            "ren \"{}\" \"{}\"{}",
            from.display(),
            new_name,
            LINE_END
        )
    }

    /// Remove an intermediate file in the current directory.
    pub fn write_delete(&mut self, file_name: &str) -> io::Result<()> {
        write!(self.writer, "del \"{}\"{}", file_name, LINE_END)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
