use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Output and error sink handed to every command.
///
/// Each call writes one complete message followed by a newline, so a
/// message is never interleaved with another one.
pub trait Ui: Send + Sync {
    fn output(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Writes output to stdout and errors (in red) to stderr.
#[derive(Debug, Default)]
pub struct ConsoleUi;

impl ConsoleUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for ConsoleUi {
    fn output(&self, msg: &str) {
        let line = format!("{}\n", msg);
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = out.write_all(line.as_bytes()).and_then(|_| out.flush()) {
            tracing::debug!(error = %e, "failed to write to stdout");
        }
    }

    fn error(&self, msg: &str) {
        let line = format!("{}\n", msg.red());
        let stderr = io::stderr();
        let mut out = stderr.lock();
        if let Err(e) = out.write_all(line.as_bytes()) {
            tracing::debug!(error = %e, "failed to write to stderr");
        }
    }
}

/// Collects everything written to it. Used by tests and embedders that
/// want to inspect what a command printed.
#[derive(Debug, Default)]
pub struct BufferUi {
    out: Mutex<String>,
    err: Mutex<String>,
}

impl BufferUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_text(&self) -> String {
        self.out.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn error_text(&self) -> String {
        self.err.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Ui for BufferUi {
    fn output(&self, msg: &str) {
        if let Ok(mut out) = self.out.lock() {
            out.push_str(msg);
            out.push('\n');
        }
    }

    fn error(&self, msg: &str) {
        if let Ok(mut err) = self.err.lock() {
            err.push_str(msg);
            err.push('\n');
        }
    }
}
