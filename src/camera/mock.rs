use image::{Rgb, RgbImage};

use super::{FrameError, FrameSource};

/// Side of the checker block drawn in the middle of each frame
const PATTERN_SIZE: u32 = 100;
/// Side of one checker cell
const CELL_SIZE: u32 = 10;

/// Synthetic camera: a diagonal gray gradient with a checker block in the
/// center. Contains no decodable symbol.
#[derive(Debug, Clone)]
pub struct MockCamera {
    width: u32,
    height: u32,
    remaining: Option<u64>,
    produced: u64,
}

impl MockCamera {
    /// Produce `frame_limit` frames (unbounded when `None`), then end the stream
    pub fn new(width: u32, height: u32, frame_limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            remaining: frame_limit,
            produced: 0,
        }
    }

    /// Frames produced so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    fn render(&self) -> RgbImage {
        let (cx, cy) = (self.width / 2, self.height / 2);
        let half = PATTERN_SIZE / 2;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let in_block = x + half >= cx && x < cx + half && y + half >= cy && y < cy + half;
            if in_block {
                if (x / CELL_SIZE + y / CELL_SIZE) % 2 == 0 {
                    Rgb([0, 0, 0])
                } else {
                    Rgb([255, 255, 255])
                }
            } else {
                let gray = ((x + y) % 256) as u8;
                Rgb([gray, gray, gray])
            }
        })
    }
}

impl FrameSource for MockCamera {
    fn next_frame(&mut self) -> Result<RgbImage, FrameError> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(FrameError::EndOfStream);
            }
            *remaining -= 1;
        }
        self.produced += 1;
        Ok(self.render())
    }

    fn describe(&self) -> String {
        format!("mock camera {}x{}", self.width, self.height)
    }
}
