//! qr_watch - keep the QR code in front of a webcam in a text file
//!
//! The scanner polls a frame source, converts each frame to grayscale, decodes
//! it and runs the result through a debouncer. Only confirmed changes reach
//! the output file, so another process can read a stable value.
//!
//! ```no_run
//! use qr_watch::{Debouncer, FileSink, MockCamera, QrDecoder, Scanner};
//!
//! let mut scanner = Scanner::new(
//!     MockCamera::new(640, 480, Some(10)),
//!     QrDecoder::new(),
//!     FileSink::new("code.txt"),
//!     Debouncer::new(8),
//! );
//! let reason = scanner.run();
//! println!("stopped: {reason}");
//! ```

#![warn(missing_docs)]

/// Frame sources (webcam, synthetic, still images)
pub mod camera;
/// Command-line flags of the scanner binary
pub mod cli;
/// Layered configuration
pub mod config;
/// Debounce state machine
pub mod debounce;
/// Symbol decoding
pub mod decoder;
/// Optional preview window
pub mod display;
/// Core data structures (symbols, decode results)
pub mod models;
/// Output file writer with bounded retry
pub mod persist;
/// The polling loop
pub mod scanner;
/// Stop marker file
pub mod sentinel;
/// Interrupt handling
pub mod shutdown;
/// Logging setup
pub mod telemetry;
/// Helpers for the diagnostic tool
pub mod tools;
/// Utility functions (pixel format conversion)
pub mod utils;

pub use camera::{FrameError, FrameSource, MockCamera, StillFrames};
pub use config::Config;
pub use debounce::{Debouncer, Update};
pub use decoder::{QrDecoder, SymbolDecoder};
pub use models::{DecodeResult, Point, Symbol, SymbolMeta};
pub use persist::{CodeSink, FileSink, PersistError, RetryPolicy};
pub use scanner::{ScanStats, Scanner, Step, StopReason};
pub use sentinel::Sentinel;
pub use shutdown::ShutdownFlag;
