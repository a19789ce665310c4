use std::path::{Path, PathBuf};

use crate::camera::FrameError;
use crate::camera::stills::{list_images, load_frame};
use crate::debounce::{Debouncer, Update};
use crate::decoder::{QrDecoder, SymbolDecoder};
use crate::models::DecodeResult;
use crate::utils::grayscale::to_grayscale;

/// Summary statistics for grayscale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrayStats {
    /// Minimum grayscale value.
    pub min: u8,
    /// Maximum grayscale value.
    pub max: u8,
    /// Average grayscale value.
    pub avg: u8,
}

/// Compute min/max/avg for grayscale values.
pub fn grayscale_stats(gray: &[u8]) -> GrayStats {
    if gray.is_empty() {
        return GrayStats { min: 0, max: 0, avg: 0 };
    }
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in gray {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    let avg = (sum / gray.len() as u64) as u8;
    GrayStats { min, max, avg }
}

/// One still image run through grayscale conversion and the decoder.
#[derive(Debug, Clone)]
pub struct ImageScan {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Grayscale statistics
    pub stats: GrayStats,
    /// Decoder output
    pub result: DecodeResult,
}

/// Decode a single image file.
pub fn scan_image(path: &Path, decoder: &mut impl SymbolDecoder) -> Result<ImageScan, FrameError> {
    let frame = load_frame(path)?;
    let gray = to_grayscale(&frame);
    Ok(ImageScan {
        width: gray.width(),
        height: gray.height(),
        stats: grayscale_stats(gray.as_raw()),
        result: decoder.decode(&gray),
    })
}

/// A commit observed while replaying stills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEvent {
    /// Zero-based frame index
    pub frame: usize,
    /// Image that triggered the commit
    pub path: PathBuf,
    /// The committed change
    pub update: Update,
}

/// Feed every image in `dir` (name order) through the decoder and a fresh
/// debouncer; returns the commits in order.
///
/// `on_commit` is called for each commit as it happens. A decoder error ends
/// the replay early, like it ends a live scan.
pub fn replay_dir(
    dir: &Path,
    max_retry: u32,
    mut on_commit: impl FnMut(&ReplayEvent),
) -> Result<Vec<ReplayEvent>, FrameError> {
    let paths = list_images(dir)?;
    let mut decoder = QrDecoder::new();
    let mut debouncer = Debouncer::new(max_retry);
    let mut events = Vec::new();

    for (frame, path) in paths.into_iter().enumerate() {
        let scan = scan_image(&path, &mut decoder)?;
        if let Some(update) = debouncer.update(&scan.result) {
            let event = ReplayEvent {
                frame,
                path,
                update,
            };
            on_commit(&event);
            events.push(event);
        }
        if scan.result.is_error() {
            break;
        }
    }
    Ok(events)
}
