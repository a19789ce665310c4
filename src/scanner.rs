//! The polling loop
//!
//! Each iteration waits the poll interval, grabs a frame, converts it to
//! grayscale, decodes it, feeds the result to the debouncer and persists any
//! committed change. Stop conditions are checked only between iterations.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::camera::{FrameError, FrameSource};
use crate::debounce::{Debouncer, Update};
use crate::decoder::SymbolDecoder;
use crate::display::{Preview, PreviewEvent};
use crate::models::DecodeResult;
use crate::persist::CodeSink;
use crate::sentinel::Sentinel;
use crate::shutdown::ShutdownFlag;
use crate::utils::grayscale::GrayscaleConverter;

/// Default delay before each iteration
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Why the loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A termination signal was received
    Interrupted,
    /// A key was pressed in the preview window
    KeyPressed,
    /// The preview window was closed
    PreviewClosed,
    /// The stop marker file appeared (and was removed)
    Sentinel,
    /// The frame source stopped producing frames
    EndOfStream(String),
    /// The decoder reported a failure
    DecodeFailed(String),
}

impl StopReason {
    /// Whether the loop ended because something went wrong
    pub fn is_fatal(&self) -> bool {
        matches!(self, StopReason::EndOfStream(_) | StopReason::DecodeFailed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Interrupted => write!(f, "interrupted"),
            StopReason::KeyPressed => write!(f, "key pressed"),
            StopReason::PreviewClosed => write!(f, "preview window closed"),
            StopReason::Sentinel => write!(f, "stop marker found"),
            StopReason::EndOfStream(detail) => write!(f, "frame source ended: {detail}"),
            StopReason::DecodeFailed(detail) => write!(f, "decoder failed: {detail}"),
        }
    }
}

/// Outcome of a single iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Keep polling
    Continue,
    /// Leave the loop
    Stop(StopReason),
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Frames pulled from the source
    pub frames: u64,
    /// Frames that contained at least one symbol
    pub frames_with_symbols: u64,
    /// Changes committed by the debouncer
    pub commits: u64,
    /// Commits that could not be written
    pub persist_failures: u64,
}

/// Owns every collaborator of the polling loop; dropping it releases the
/// frame source and the preview window through their own `Drop`.
pub struct Scanner<S, D, W> {
    source: S,
    decoder: D,
    sink: W,
    debouncer: Debouncer,
    converter: GrayscaleConverter,
    interval: Duration,
    shutdown: ShutdownFlag,
    sentinel: Option<Sentinel>,
    preview: Option<Box<dyn Preview>>,
    stats: ScanStats,
}

impl<S: FrameSource, D: SymbolDecoder, W: CodeSink> Scanner<S, D, W> {
    /// Assemble a scanner with the default interval and no stop triggers
    /// besides the frame source and decoder
    pub fn new(source: S, decoder: D, sink: W, debouncer: Debouncer) -> Self {
        Self {
            source,
            decoder,
            sink,
            debouncer,
            converter: GrayscaleConverter::new(),
            interval: DEFAULT_INTERVAL,
            shutdown: ShutdownFlag::new(),
            sentinel: None,
            preview: None,
            stats: ScanStats::default(),
        }
    }

    /// Set the delay before each iteration
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop when `shutdown` is raised
    pub fn with_shutdown(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Stop when the sentinel file appears
    pub fn with_sentinel(mut self, sentinel: Sentinel) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Show frames in `preview` and stop on key press
    pub fn with_preview(mut self, preview: Box<dyn Preview>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Debounce state
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Counters so far
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// The code sink
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Handle that stops the loop at the next iteration
    pub fn shutdown_handle(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    /// Poll until a stop condition is met
    pub fn run(&mut self) -> StopReason {
        info!(source = %self.source.describe(), interval_ms = self.interval.as_millis() as u64,
            max_retry = self.debouncer.max_retry(), "scanner started");
        loop {
            if let Step::Stop(reason) = self.step() {
                info!(%reason, frames = self.stats.frames, commits = self.stats.commits, "scanner stopped");
                return reason;
            }
        }
    }

    /// Run exactly one iteration
    pub fn step(&mut self) -> Step {
        if self.shutdown.is_requested() {
            return Step::Stop(StopReason::Interrupted);
        }

        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }

        let frame = match self.source.next_frame() {
            Ok(frame) => frame,
            Err(FrameError::EndOfStream) => {
                return Step::Stop(StopReason::EndOfStream("no more frames".to_string()));
            }
            Err(err) => return Step::Stop(StopReason::EndOfStream(err.to_string())),
        };
        self.stats.frames += 1;

        let gray = self.converter.convert(&frame);

        let mut preview_failed = false;
        if let Some(preview) = self.preview.as_mut() {
            if let Err(err) = preview.show(gray) {
                warn!(error = %err, "preview disabled");
                preview_failed = true;
            }
        }
        if preview_failed {
            self.preview = None;
        }

        let result = self.decoder.decode(gray);
        if result.symbol_count() > 0 {
            self.stats.frames_with_symbols += 1;
        }
        debug!(
            frame = self.stats.frames,
            symbols = result.symbol_count(),
            first = %String::from_utf8_lossy(result.first_code().unwrap_or_default()),
            retry = self.debouncer.retry_count(),
            "frame decoded"
        );

        if let Some(update) = self.debouncer.update(&result) {
            self.commit(&update);
        }

        if let DecodeResult::Error(detail) = result {
            return Step::Stop(StopReason::DecodeFailed(detail));
        }

        if let Some(preview) = self.preview.as_mut() {
            match preview.poll() {
                PreviewEvent::KeyPressed => return Step::Stop(StopReason::KeyPressed),
                PreviewEvent::Closed => return Step::Stop(StopReason::PreviewClosed),
                PreviewEvent::Idle => {}
            }
        }

        if self.sentinel.as_ref().is_some_and(Sentinel::take) {
            return Step::Stop(StopReason::Sentinel);
        }

        Step::Continue
    }

    fn commit(&mut self, update: &Update) {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        match update {
            Update::Appeared(code) => info!(code = %text(code), "new code"),
            Update::Replaced { previous, current } => {
                info!(previous = %text(previous), code = %text(current), "code replaced")
            }
            Update::Cleared { previous } => info!(previous = %text(previous), "code removed"),
        }
        self.stats.commits += 1;

        // In-memory state is kept even when the write fails.
        if let Err(err) = self.sink.persist(update.payload()) {
            self.stats.persist_failures += 1;
            warn!(error = %err, attempts = err.attempts, "could not persist code");
        }
    }
}
