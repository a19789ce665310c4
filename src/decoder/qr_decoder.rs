use image::GrayImage;
use tracing::{debug, trace};

use super::{DecodeError, SymbolDecoder};
use crate::models::{DecodeResult, Point, Symbol, SymbolMeta};

/// QR decoder that locates every grid in a frame and decodes each one
#[derive(Debug, Default, Clone)]
pub struct QrDecoder {
    frames_scanned: u64,
}

impl QrDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames scanned so far
    pub fn frames_scanned(&self) -> u64 {
        self.frames_scanned
    }

    /// Scan a frame, reporting decoder failures as errors.
    ///
    /// Grids that are located but fail to decode are treated as misreads and
    /// skipped; they never turn the whole frame into an error.
    pub fn scan(&mut self, frame: &GrayImage) -> Result<Vec<Symbol>, DecodeError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::EmptyFrame { width, height });
        }
        self.frames_scanned += 1;

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                frame.get_pixel(x as u32, y as u32).0[0]
            });
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), "grids located");

        let mut symbols = Vec::with_capacity(grids.len());
        for (idx, grid) in grids.iter().enumerate() {
            // Raw bytes: payloads need not be UTF-8 (Shift-JIS, binary).
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(meta) => {
                    let corners = grid.bounds.map(|p| Point::new(p.x, p.y));
                    symbols.push(Symbol::new(payload).with_meta(SymbolMeta {
                        version: meta.version.0,
                        ecc_level: meta.ecc_level,
                        mask: meta.mask,
                        corners,
                    }));
                }
                Err(err) => debug!(grid = idx, error = %err, "grid failed to decode"),
            }
        }
        Ok(symbols)
    }
}

impl SymbolDecoder for QrDecoder {
    fn decode(&mut self, frame: &GrayImage) -> DecodeResult {
        match self.scan(frame) {
            Ok(symbols) => DecodeResult::from_symbols(symbols),
            Err(err) => DecodeResult::Error(err.to_string()),
        }
    }
}
