//! Stop marker file
//!
//! Another process asks the scanner to stop by creating the marker file. The
//! scanner deletes it as soon as it is seen so the next run starts clean.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Marker file polled once per loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    path: PathBuf,
}

impl Sentinel {
    /// Watch `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Watched path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the marker currently exists
    pub fn is_present(&self) -> bool {
        self.path.exists()
    }

    /// Remove the marker if present. Returns `true` when it was there.
    ///
    /// A marker that exists but cannot be deleted still counts as seen.
    pub fn take(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                let present = self.is_present();
                if present {
                    warn!(path = %self.path.display(), error = %err, "stop marker could not be removed");
                }
                present
            }
        }
    }
}
