//! Utility functions for frame handling
//!
//! - Grayscale conversion (RGB to luminance)
//! - YUYV to RGB unpacking for raw camera buffers

/// Pixel format conversion
pub mod grayscale;
