use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::trace;

use super::{FrameError, FrameSource};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// List image files directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}

/// Load an image file as an RGB frame
pub fn load_frame(path: &Path) -> Result<RgbImage, FrameError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Replays image files from a directory in name order
#[derive(Debug, Clone)]
pub struct StillFrames {
    dir: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
    looping: bool,
}

impl StillFrames {
    /// Open `dir`; fails when it holds no images
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> Result<Self, FrameError> {
        let dir = dir.as_ref();
        let paths = list_images(dir).map_err(|err| {
            FrameError::Unavailable(format!("cannot read {}: {}", dir.display(), err))
        })?;
        if paths.is_empty() {
            return Err(FrameError::Unavailable(format!(
                "no images in {}",
                dir.display()
            )));
        }
        Ok(Self::from_paths(dir, paths, looping))
    }

    /// Replay an explicit list of image files
    pub fn from_paths(dir: impl Into<PathBuf>, paths: Vec<PathBuf>, looping: bool) -> Self {
        Self {
            dir: dir.into(),
            paths,
            next: 0,
            looping,
        }
    }

    /// Number of images in the sequence
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for StillFrames {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        if self.next >= self.paths.len() {
            if !self.looping || self.paths.is_empty() {
                return Err(FrameError::EndOfStream);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;
        trace!(path = %path.display(), "loading still frame");
        load_frame(path)
    }

    fn describe(&self) -> String {
        format!("{} still frame(s) from {}", self.paths.len(), self.dir.display())
    }
}
