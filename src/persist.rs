//! Writes the active code to the output file other processes read

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

/// Default number of write attempts
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 5;
/// Default pause between write attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Persisting failed after every attempt
#[derive(Debug, thiserror::Error)]
#[error("failed to write {path} after {attempts} attempt(s): {source}")]
pub struct PersistError {
    /// Target path
    pub path: PathBuf,
    /// Attempts made
    pub attempts: u32,
    /// Error from the last attempt
    #[source]
    pub source: io::Error,
}

/// Bounded retry with a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; zero attempts is treated as one
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// Returns the last error together with the number of attempts made.
    pub fn run<T>(&self, mut op: impl FnMut() -> io::Result<T>) -> Result<T, (io::Error, u32)> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => return Err((err, attempt)),
                Err(err) => {
                    trace!(attempt, error = %err, "write attempt failed, retrying");
                    thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Destination for committed codes
pub trait CodeSink {
    /// Replace the stored value with `code`
    fn persist(&mut self, code: &[u8]) -> Result<(), PersistError>;
}

impl<S: CodeSink + ?Sized> CodeSink for Box<S> {
    fn persist(&mut self, code: &[u8]) -> Result<(), PersistError> {
        (**self).persist(code)
    }
}

/// Truncating writer for a single flat file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    retry: RetryPolicy,
}

impl FileSink {
    /// Sink writing to `path` with the default retry policy
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_retry(path, RetryPolicy::default())
    }

    /// Sink with an explicit retry policy
    pub fn with_retry(path: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            path: path.into(),
            retry,
        }
    }

    /// Output path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Retry policy in use
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}

/// Write `code` to `path` as raw bytes, truncating whatever was there.
pub fn write_code(path: &Path, code: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(code)?;
    file.flush()
}

impl CodeSink for FileSink {
    fn persist(&mut self, code: &[u8]) -> Result<(), PersistError> {
        let path = &self.path;
        self.retry
            .run(|| write_code(path, code))
            .map_err(|(source, attempts)| PersistError {
                path: path.clone(),
                attempts,
                source,
            })?;
        debug!(path = %path.display(), bytes = code.len(), "code persisted");
        Ok(())
    }
}
