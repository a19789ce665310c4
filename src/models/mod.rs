//! Core data structures shared by the scanning pipeline

/// Pixel coordinates
pub mod point;
/// Decoded symbols and per-frame results
pub mod symbol;

pub use point::Point;
pub use symbol::{DecodeResult, Symbol, SymbolMeta};
