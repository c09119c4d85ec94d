//! Output sink for the `log` intrinsic

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where script log lines go
#[derive(Debug, Clone, Default)]
pub enum Console {
    /// Process standard output
    #[default]
    Stdout,
    /// In-memory buffer, used by tests and embedders that collect output
    Capture(Arc<Mutex<Vec<String>>>),
}

impl Console {
    pub fn stdout() -> Self {
        Console::Stdout
    }

    pub fn capture() -> Self {
        Console::Capture(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn write_line(&self, line: &str) {
        match self {
            Console::Stdout => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                if let Err(err) = writeln!(out, "{}", line) {
                    tracing::warn!(error = %err, "failed to write log line to stdout");
                }
            }
            Console::Capture(lines) => lines.lock().push(line.to_string()),
        }
    }

    /// Captured lines so far (always empty for stdout)
    pub fn lines(&self) -> Vec<String> {
        match self {
            Console::Stdout => Vec::new(),
            Console::Capture(lines) => lines.lock().clone(),
        }
    }
}
