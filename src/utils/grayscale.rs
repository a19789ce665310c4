//! Pixel format conversions for captured frames
//!
//! Luminance uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8,
//! an approximation of Y = 0.299*R + 0.587*G + 0.114*B.

use image::{GrayImage, RgbImage};

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Convert packed RGB bytes to grayscale
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    rgb_to_grayscale_into(rgb, &mut gray);
    gray
}

/// Convert packed RGB bytes into a pre-allocated buffer.
///
/// Converts as many whole pixels as both buffers hold and returns that count.
pub fn rgb_to_grayscale_into(rgb: &[u8], output: &mut [u8]) -> usize {
    let mut written = 0;
    for (px, out) in rgb.chunks_exact(3).zip(output.iter_mut()) {
        *out = luma(px[0], px[1], px[2]);
        written += 1;
    }
    written
}

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    // BT.601 limited range
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    [
        clamp_u8((298 * c + 409 * e + 128) >> 8),
        clamp_u8((298 * c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((298 * c + 516 * d + 128) >> 8),
    ]
}

/// Unpack a YUYV buffer into packed RGB bytes
pub fn yuyv_to_rgb(yuyv: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for quad in yuyv.chunks_exact(4).take(width * height / 2) {
        let (y0, u, y1, v) = (quad[0], quad[1], quad[2], quad[3]);
        rgb.extend_from_slice(&yuv_to_rgb(y0, u, v));
        rgb.extend_from_slice(&yuv_to_rgb(y1, u, v));
    }
    rgb.resize(width * height * 3, 0);
    rgb
}

/// Convert a color frame to an 8-bit frame of the same dimensions
pub fn to_grayscale(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let gray = rgb_to_grayscale(frame.as_raw(), width as usize, height as usize);
    // Length is width * height by construction.
    GrayImage::from_raw(width, height, gray).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Grayscale converter that reuses its output buffer across frames
#[derive(Debug, Default)]
pub struct GrayscaleConverter {
    buffer: GrayImage,
}

impl GrayscaleConverter {
    /// Create a converter with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `frame`, reallocating only when the frame size changes
    pub fn convert(&mut self, frame: &RgbImage) -> &GrayImage {
        if self.buffer.dimensions() != frame.dimensions() {
            let (width, height) = frame.dimensions();
            self.buffer = GrayImage::new(width, height);
        }
        rgb_to_grayscale_into(frame.as_raw(), &mut self.buffer);
        &self.buffer
    }
}
