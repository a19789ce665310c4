use image::{ImageFormat, RgbImage};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::video::capture::Parameters;
use v4l::{Device, FourCC};

use super::{FrameError, FrameSource};
use crate::config::CameraConfig;
use crate::utils::grayscale::yuyv_to_rgb;

const BUFFER_COUNT: u32 = 4;
const MJPG: &[u8; 4] = b"MJPG";
const YUYV: &[u8; 4] = b"YUYV";

/// Pixel layouts this backend can turn into RGB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Mjpeg,
    Yuyv,
}

/// Video4Linux webcam streaming through memory-mapped buffers.
///
/// The stream is declared before the device so it is torn down first.
pub struct V4lCamera {
    stream: Stream<'static>,
    _device: Device,
    device_id: u32,
    width: u32,
    height: u32,
    layout: Layout,
}

impl V4lCamera {
    /// Open `/dev/video{device_id}` and negotiate a capture format
    pub fn open(config: &CameraConfig) -> Result<Self, FrameError> {
        let device = Device::new(config.device_id as usize).map_err(|err| {
            FrameError::Unavailable(format!("cannot open video device {}: {}", config.device_id, err))
        })?;

        let mut requested = device.format()?;
        requested.width = config.width;
        requested.height = config.height;
        requested.fourcc = FourCC::new(MJPG);
        let format = device.set_format(&requested)?;

        let layout = if format.fourcc == FourCC::new(MJPG) {
            Layout::Mjpeg
        } else if format.fourcc == FourCC::new(YUYV) {
            Layout::Yuyv
        } else {
            return Err(FrameError::Unavailable(format!(
                "device {} offers unsupported pixel format {}",
                config.device_id, format.fourcc
            )));
        };

        if config.fps > 0 {
            if let Err(err) = device.set_params(&Parameters::with_fps(config.fps)) {
                warn!(fps = config.fps, error = %err, "camera rejected frame rate");
            }
        }

        let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)?;
        info!(
            device = config.device_id,
            width = format.width,
            height = format.height,
            fourcc = %format.fourcc,
            "camera opened"
        );

        Ok(Self {
            stream,
            _device: device,
            device_id: config.device_id,
            width: format.width,
            height: format.height,
            layout,
        })
    }
}

impl FrameSource for V4lCamera {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        let (buf, meta) = self.stream.next()?;
        let used = (meta.bytesused as usize).min(buf.len());
        let data = &buf[..used];
        debug!(bytes = used, sequence = meta.sequence, "frame captured");

        match self.layout {
            Layout::Mjpeg => {
                Ok(image::load_from_memory_with_format(data, ImageFormat::Jpeg)?.to_rgb8())
            }
            Layout::Yuyv => {
                let expected = self.width as usize * self.height as usize * 2;
                if data.len() < expected {
                    return Err(FrameError::Malformed(format!(
                        "YUYV frame has {} bytes, expected {}",
                        data.len(),
                        expected
                    )));
                }
                let rgb = yuyv_to_rgb(data, self.width as usize, self.height as usize);
                RgbImage::from_raw(self.width, self.height, rgb)
                    .ok_or_else(|| FrameError::Malformed("RGB buffer size mismatch".to_string()))
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "/dev/video{} {}x{} {:?}",
            self.device_id, self.width, self.height, self.layout
        )
    }
}

impl Drop for V4lCamera {
    fn drop(&mut self) {
        info!(device = self.device_id, "camera released");
    }
}
