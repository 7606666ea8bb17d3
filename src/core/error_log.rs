use chrono::{Local, NaiveDateTime};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

pub const DEFAULT_ERROR_LOG: &str = "errors.txt";

/// Append-only failure log. Never read back, never rotated.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a failed run: message, cause chain and backtrace.
    pub fn record(&self, err: &anyhow::Error) {
        error!(error = %format!("{:#}", err), path = %self.path.display(), "run failed");
        self.append(&describe(err));
    }

    /// Best effort: a failed write is only reported through tracing.
    pub fn append(&self, description: &str) {
        let entry = format_entry(Local::now().naive_local(), description);
        if let Err(e) = self.write(&entry) {
            warn!(path = %self.path.display(), error = %e, "failed to write error log");
        }
    }

    fn write(&self, entry: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG)
    }
}

/// Returns "2024-03-15 07:00:01:\n{description}\n\n".
pub fn format_entry(at: NaiveDateTime, description: &str) -> String {
    format!("{}:\n{}\n\n", at.format("%Y-%m-%d %H:%M:%S"), description)
}

/// Message plus "Caused by:" chain and the backtrace captured where the error
/// was created. Scheduled runs call [`enable_backtraces`] first; without it only
/// the cause chain is recorded.
pub fn describe(err: &anyhow::Error) -> String {
    format!("{:?}", err)
}

/// Turn on backtrace capture for errors created after this call, unless
/// `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` is already set.
pub fn enable_backtraces() {
    if needs_lib_backtrace(|key| std::env::var_os(key)) {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }
}

fn needs_lib_backtrace<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<OsString>,
{
    lookup("RUST_LIB_BACKTRACE").is_none() && lookup("RUST_BACKTRACE").is_none()
}
