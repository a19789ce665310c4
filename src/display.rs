//! Optional preview window
//!
//! The window shows the grayscale frame handed to the decoder. Any key press,
//! or closing the window, asks the scanner to stop.

use image::GrayImage;

/// Preview failures
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    /// This build has no window backend
    #[error("preview window not available in this build (enable the `display` feature)")]
    Unsupported,
    /// The window backend failed
    #[error("preview window error: {0}")]
    Backend(String),
}

/// What the preview saw since the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewEvent {
    /// Nothing happened
    Idle,
    /// A key was pressed
    KeyPressed,
    /// The window was closed
    Closed,
}

/// A surface frames are shown on
pub trait Preview {
    /// Show one frame
    fn show(&mut self, frame: &GrayImage) -> Result<(), DisplayError>;

    /// Report input received since the last call
    fn poll(&mut self) -> PreviewEvent;
}

/// Open the preview window titled `title`
#[cfg(feature = "display")]
pub fn open_preview(title: &str) -> Result<Box<dyn Preview>, DisplayError> {
    Ok(Box::new(window::WindowPreview::new(title)))
}

/// Open the preview window titled `title`
#[cfg(not(feature = "display"))]
pub fn open_preview(_title: &str) -> Result<Box<dyn Preview>, DisplayError> {
    Err(DisplayError::Unsupported)
}

/// Expand 8-bit gray pixels to 0RGB words
pub fn gray_to_argb(frame: &GrayImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(frame.as_raw().iter().map(|&v| {
        let v = v as u32;
        (v << 16) | (v << 8) | v
    }));
}

#[cfg(feature = "display")]
mod window {
    use image::GrayImage;
    use minifb::{KeyRepeat, Window, WindowOptions};
    use tracing::debug;

    use super::{DisplayError, Preview, PreviewEvent, gray_to_argb};

    /// `minifb` window, created on the first frame and recreated when the
    /// frame size changes
    pub struct WindowPreview {
        title: String,
        window: Option<Window>,
        size: (usize, usize),
        buffer: Vec<u32>,
    }

    impl WindowPreview {
        pub fn new(title: &str) -> Self {
            Self {
                title: title.to_string(),
                window: None,
                size: (0, 0),
                buffer: Vec::new(),
            }
        }
    }

    impl Preview for WindowPreview {
        fn show(&mut self, frame: &GrayImage) -> Result<(), DisplayError> {
            let size = (frame.width() as usize, frame.height() as usize);
            if self.window.is_none() || self.size != size {
                debug!(width = size.0, height = size.1, "opening preview window");
                let window = Window::new(&self.title, size.0, size.1, WindowOptions::default())
                    .map_err(|err| DisplayError::Backend(err.to_string()))?;
                self.window = Some(window);
                self.size = size;
            }
            gray_to_argb(frame, &mut self.buffer);
            if let Some(window) = self.window.as_mut() {
                window
                    .update_with_buffer(&self.buffer, size.0, size.1)
                    .map_err(|err| DisplayError::Backend(err.to_string()))?;
            }
            Ok(())
        }

        fn poll(&mut self) -> PreviewEvent {
            match self.window.as_ref() {
                None => PreviewEvent::Idle,
                Some(window) if !window.is_open() => PreviewEvent::Closed,
                Some(window) if !window.get_keys_pressed(KeyRepeat::No).is_empty() => {
                    PreviewEvent::KeyPressed
                }
                Some(_) => PreviewEvent::Idle,
            }
        }
    }
}
