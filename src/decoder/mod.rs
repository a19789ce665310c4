//! Symbol decoding
//!
//! The decoder turns a grayscale frame into a [`DecodeResult`]. Locating and
//! decoding symbols is delegated to `rqrr`; this module only adapts its
//! output to the pipeline's types.

use image::GrayImage;

use crate::models::DecodeResult;

/// QR decoder backed by `rqrr`
pub mod qr_decoder;

pub use qr_decoder::QrDecoder;

/// Decoder-level failure, as opposed to "no symbol found"
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame has no pixels
    #[error("cannot scan an empty {width}x{height} frame")]
    EmptyFrame {
        /// Frame width
        width: u32,
        /// Frame height
        height: u32,
    },
}

/// Anything that can scan a grayscale frame for symbols
pub trait SymbolDecoder {
    /// Scan one frame
    fn decode(&mut self, frame: &GrayImage) -> DecodeResult;
}

impl<D: SymbolDecoder + ?Sized> SymbolDecoder for Box<D> {
    fn decode(&mut self, frame: &GrayImage) -> DecodeResult {
        (**self).decode(frame)
    }
}
