//! Interrupt handling
//!
//! Termination signals only raise an atomic flag; the scanner reads it at the
//! top of each iteration.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::TERM_SIGNALS;

/// Shared stop request
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Create a cleared flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag on SIGINT, SIGTERM (and SIGQUIT where it exists)
    pub fn install(&self) -> io::Result<()> {
        for &signal in TERM_SIGNALS {
            signal_hook::flag::register(signal, Arc::clone(&self.0))?;
        }
        Ok(())
    }

    /// Request a stop
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = ShutdownFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_requested());
        handle.request();
        assert!(flag.is_requested());
    }
}
