//! Frame sources
//!
//! A [`FrameSource`] hands out color frames one at a time. Any error from
//! [`FrameSource::next_frame`] ends the stream; the scanner stops on it.
//! Sources release their device when dropped.

use image::RgbImage;

use crate::config::{CameraConfig, SourceConfig, SourceKind};

/// Synthetic frames for headless runs and tests
pub mod mock;
/// Still images replayed from a directory
pub mod stills;
/// Video4Linux capture
#[cfg(all(feature = "camera", target_os = "linux"))]
pub mod v4l_capture;

pub use mock::MockCamera;
pub use stills::StillFrames;
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use v4l_capture::V4lCamera;

/// Frame source failures
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The source could not be opened at all
    #[error("frame source unavailable: {0}")]
    Unavailable(String),
    /// No more frames will be produced
    #[error("end of stream")]
    EndOfStream,
    /// Device or file I/O failed
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A captured or stored frame could not be decoded
    #[error("frame decode error: {0}")]
    Image(#[from] image::ImageError),
    /// The frame buffer does not match its advertised format
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Producer of color frames
pub trait FrameSource {
    /// Block until the next frame is available
    fn next_frame(&mut self) -> Result<RgbImage, FrameError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        (**self).next_frame()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the source selected by `source`
pub fn open_source(
    source: &SourceConfig,
    camera: &CameraConfig,
) -> Result<Box<dyn FrameSource>, FrameError> {
    match source.kind {
        SourceKind::Mock => Ok(Box::new(MockCamera::new(
            camera.width,
            camera.height,
            source.mock_frames,
        ))),
        SourceKind::Stills => {
            let dir = source.stills_dir.as_ref().ok_or_else(|| {
                FrameError::Unavailable("stills source needs a directory".to_string())
            })?;
            Ok(Box::new(StillFrames::open(dir, source.loop_stills)?))
        }
        SourceKind::Camera => open_camera(camera),
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn open_camera(camera: &CameraConfig) -> Result<Box<dyn FrameSource>, FrameError> {
    Ok(Box::new(V4lCamera::open(camera)?))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn open_camera(camera: &CameraConfig) -> Result<Box<dyn FrameSource>, FrameError> {
    Err(FrameError::Unavailable(format!(
        "camera {} requested but this build has no capture backend (enable the `camera` feature on Linux)",
        camera.device_id
    )))
}
