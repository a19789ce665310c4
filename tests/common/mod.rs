//! Shared fixtures: synthetic QR frames rendered with the `qrcode` crate

#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use qrcode::{Color, QrCode};
use std::path::{Path, PathBuf};

const QUIET_ZONE: u32 = 4;

/// Render `payload` as a QR symbol, `scale` pixels per module, with a
/// four-module quiet zone.
pub fn render_qr(payload: &str, scale: u32) -> GrayImage {
    render_qr_bytes(payload.as_bytes(), scale)
}

/// Render arbitrary payload bytes (byte mode when not plain text)
pub fn render_qr_bytes(payload: &[u8], scale: u32) -> GrayImage {
    let code = QrCode::new(payload).expect("payload fits in a QR symbol");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * scale;

    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = i as u32 % modules + QUIET_ZONE;
        let my = i as u32 / modules + QUIET_ZONE;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(mx * scale + dx, my * scale + dy, Luma([0]));
            }
        }
    }
    img
}

/// Same symbol as an RGB frame
pub fn render_qr_rgb(payload: &str, scale: u32) -> RgbImage {
    to_rgb(&render_qr(payload, scale))
}

/// Expand a gray frame to RGB
pub fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// A white frame the size of a rendered symbol
pub fn blank_rgb(side: u32) -> RgbImage {
    RgbImage::from_pixel(side, side, Rgb([255, 255, 255]))
}

/// Write frames into `dir` as `000.png`, `001.png`, ... where `None` is a
/// blank frame.
pub fn write_frames(dir: &Path, frames: &[Option<&str>]) -> Vec<PathBuf> {
    let side = render_qr_rgb("probe", 4).width();
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let path = dir.join(format!("{i:03}.png"));
            let img = match frame {
                Some(payload) => render_qr_rgb(payload, 4),
                None => blank_rgb(side),
            };
            img.save(&path).expect("write fixture frame");
            path
        })
        .collect()
}
