//! Destinations for access log lines.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Error opening a log destination.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to open access log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A shared, line-oriented output.
///
/// Clones write to the same destination. Each line is written under one lock
/// with a single `write_all`, so lines from concurrent requests never
/// interleave.
#[derive(Clone)]
pub struct LogSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LogSink {
    /// Wrap any writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Standard output.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Standard error.
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    /// Open `path` for appending, creating it if needed.
    pub fn file(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_writer(file))
    }

    /// Resolve a configured destination: `stdout`, `stderr`, or a file path.
    pub fn from_destination(destination: &str) -> Result<Self, SinkError> {
        match destination {
            "stdout" | "-" => Ok(Self::stdout()),
            "stderr" => Ok(Self::stderr()),
            path => Self::file(path),
        }
    }

    /// Append `line` followed by a newline.
    ///
    /// This is blocking I/O performed while holding the lock: the calling
    /// thread waits for the write and flush, and concurrent callers queue
    /// behind it. A slow destination (full pipe, network filesystem) stalls
    /// the runtime worker that finishes the request.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(&buf)?;
        writer.flush()
    }
}

impl Default for LogSink {
    /// Standard error, undecorated.
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}
