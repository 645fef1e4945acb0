//! Terminal output
//!
//! Command output goes to stdout; every user-facing error goes through
//! [`format_error`] to stderr. Colour is applied only when stderr is a
//! terminal (and NO_COLOR/CLICOLOR allow it).

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex, PoisonError};

use colored::Colorize;

/// The one error line format.
pub fn format_error(message: &str, correlation_id: Option<&str>, color: bool) -> String {
    let label = if color {
        "Error:".red().bold().to_string()
    } else {
        "Error:".to_string()
    };
    match correlation_id {
        Some(id) => format!("{label} {message} (Correlation ID: {id})"),
        None => format!("{label} {message}"),
    }
}

/// Output channels for one invocation.
pub struct Console {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    color: bool,
}

impl Console {
    /// Process stdout/stderr.
    pub fn stdio() -> Self {
        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            color: io::stderr().is_terminal(),
        }
    }

    /// In-memory channels, uncoloured. Returns the console and readers for
    /// what was written to stdout and stderr.
    pub fn captured() -> (Self, CapturedOutput, CapturedOutput) {
        let out = CapturedOutput::default();
        let err = CapturedOutput::default();
        let console = Self {
            out: Box::new(out.clone()),
            err: Box::new(err.clone()),
            color: false,
        };
        (console, out, err)
    }

    /// Write one line of command output.
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Write raw command output without adding a newline.
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Report a failure on the error channel. Write errors are dropped: there
    /// is nowhere left to report them.
    pub fn error(&mut self, message: &str, correlation_id: Option<&str>) {
        let line = format_error(message, correlation_id, self.color);
        let _ = writeln!(self.err, "{line}");
        let _ = self.err.flush();
    }
}

/// Shared in-memory sink.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
