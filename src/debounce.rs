//! Debounce state machine deciding when a detected code becomes the active one
//!
//! A code that appears while nothing is active is committed at once. Replacing
//! or clearing an active code needs `max_retry + 1` consecutive disagreeing
//! observations, so single-frame misreads and brief occlusion never reach the
//! output file.
//!
//! Codes are raw payload bytes. An empty payload means "no code visible".

use crate::models::DecodeResult;

/// Default number of disagreeing frames tolerated before a change is committed
pub const DEFAULT_MAX_RETRY: u32 = 8;

/// A committed change of the active code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A code appeared while none was active
    Appeared(Vec<u8>),
    /// A different code replaced the active one
    Replaced {
        /// Code that was active before
        previous: Vec<u8>,
        /// Code that is active now
        current: Vec<u8>,
    },
    /// The active code left the view
    Cleared {
        /// Code that was active before
        previous: Vec<u8>,
    },
}

impl Update {
    /// The bytes to persist: the new code, or nothing when cleared
    pub fn payload(&self) -> &[u8] {
        match self {
            Update::Appeared(code) => code,
            Update::Replaced { current, .. } => current,
            Update::Cleared { .. } => &[],
        }
    }
}

/// Hysteresis over successive decode results
#[derive(Debug, Clone)]
pub struct Debouncer {
    last_code: Option<Vec<u8>>,
    retry_count: u32,
    max_retry: u32,
}

impl Debouncer {
    /// Start with no active code
    pub fn new(max_retry: u32) -> Self {
        Self {
            last_code: None,
            retry_count: 0,
            max_retry,
        }
    }

    /// Start from an already-active code; an empty code starts inactive
    pub fn with_active(max_retry: u32, code: impl Into<Vec<u8>>) -> Self {
        let code = code.into();
        Self {
            last_code: (!code.is_empty()).then_some(code),
            retry_count: 0,
            max_retry,
        }
    }

    /// Currently active code
    pub fn last_code(&self) -> Option<&[u8]> {
        self.last_code.as_deref()
    }

    /// Consecutive disagreeing observations so far
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Commit threshold
    pub fn max_retry(&self) -> u32 {
        self.max_retry
    }

    /// Feed one observation. Returns the committed change, if any.
    ///
    /// `DecodeResult::Error` counts as a frame without a symbol.
    pub fn update(&mut self, observation: &DecodeResult) -> Option<Update> {
        self.observe(observation.first_code())
    }

    /// Feed one observation given as the first decoded payload
    pub fn observe(&mut self, first_code: Option<&[u8]>) -> Option<Update> {
        let first_code = first_code.filter(|code| !code.is_empty());

        let Some(active) = self.last_code.as_deref() else {
            let code = first_code?;
            self.last_code = Some(code.to_vec());
            self.retry_count = 0;
            return Some(Update::Appeared(code.to_vec()));
        };

        if first_code == Some(active) {
            self.retry_count = 0;
            return None;
        }

        if self.retry_count != self.max_retry {
            // Clamped so the equality check below can never be skipped.
            self.retry_count = (self.retry_count + 1).min(self.max_retry);
            return None;
        }

        self.retry_count = 0;
        let previous = self.last_code.take().unwrap_or_default();
        match first_code {
            Some(code) => {
                self.last_code = Some(code.to_vec());
                Some(Update::Replaced {
                    previous,
                    current: code.to_vec(),
                })
            }
            None => Some(Update::Cleared { previous }),
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen(code: &str) -> Option<&[u8]> {
        Some(code.as_bytes())
    }

    #[test]
    fn test_absent_to_present_is_immediate() {
        let mut debouncer = Debouncer::new(8);
        assert_eq!(debouncer.update(&DecodeResult::NoSymbol), None);
        assert_eq!(
            debouncer.update(&DecodeResult::code("ABC")),
            Some(Update::Appeared("ABC".into()))
        );
        assert_eq!(debouncer.last_code(), seen("ABC"));
        assert_eq!(debouncer.retry_count(), 0);
    }

    #[test]
    fn test_absent_stays_absent() {
        let mut debouncer = Debouncer::new(3);
        for _ in 0..10 {
            assert_eq!(debouncer.update(&DecodeResult::NoSymbol), None);
        }
        assert_eq!(debouncer.retry_count(), 0);
        assert_eq!(debouncer.last_code(), None);
    }

    #[test]
    fn test_empty_payload_is_no_code() {
        let mut debouncer = Debouncer::new(8);
        assert_eq!(debouncer.update(&DecodeResult::code("")), None);
        assert_eq!(debouncer.last_code(), None);

        // The next real code is still a first appearance.
        assert_eq!(
            debouncer.update(&DecodeResult::code("ABC")),
            Some(Update::Appeared("ABC".into()))
        );
    }

    #[test]
    fn test_empty_payload_counts_toward_clear() {
        let mut debouncer = Debouncer::with_active(1, "ABC");
        assert_eq!(debouncer.observe(seen("")), None);
        assert_eq!(
            debouncer.observe(seen("")),
            Some(Update::Cleared {
                previous: "ABC".into()
            })
        );
        assert_eq!(Debouncer::with_active(1, "").last_code(), None);
    }

    #[test]
    fn test_non_utf8_codes_compare_by_bytes() {
        let shift_jis: &[u8] = &[0x83, 0x65, 0x83, 0x58, 0x83, 0x67];
        let mut debouncer = Debouncer::new(0);
        assert_eq!(
            debouncer.observe(Some(shift_jis)),
            Some(Update::Appeared(shift_jis.to_vec()))
        );
        assert_eq!(debouncer.observe(Some(shift_jis)), None);
        assert_eq!(debouncer.last_code(), Some(shift_jis));
    }

    #[test]
    fn test_matching_observation_resets_counter() {
        let mut debouncer = Debouncer::with_active(8, "ABC");
        debouncer.observe(seen("XYZ"));
        debouncer.observe(None);
        assert_eq!(debouncer.retry_count(), 2);
        assert_eq!(debouncer.observe(seen("ABC")), None);
        assert_eq!(debouncer.retry_count(), 0);
    }

    #[test]
    fn test_mixed_disagreement_counts_together() {
        // Alternating other codes and empty frames all count as disagreement;
        // the commit takes whatever is seen at the threshold.
        let mut debouncer = Debouncer::with_active(2, "ABC");
        assert_eq!(debouncer.observe(seen("X")), None);
        assert_eq!(debouncer.observe(None), None);
        assert_eq!(
            debouncer.observe(seen("Y")),
            Some(Update::Replaced {
                previous: "ABC".into(),
                current: "Y".into()
            })
        );
    }

    #[test]
    fn test_zero_threshold_commits_first_disagreement() {
        let mut debouncer = Debouncer::with_active(0, "ABC");
        assert_eq!(
            debouncer.observe(None),
            Some(Update::Cleared {
                previous: "ABC".into()
            })
        );
        assert_eq!(debouncer.last_code(), None);
    }

    #[test]
    fn test_error_counts_as_absent() {
        let mut debouncer = Debouncer::with_active(0, "ABC");
        let update = debouncer.update(&DecodeResult::Error("boom".into()));
        assert_eq!(update.as_ref().map(Update::payload), Some(&[][..]));
    }

    #[test]
    fn test_payload() {
        assert_eq!(Update::Appeared("A".into()).payload(), b"A");
        assert_eq!(
            Update::Replaced {
                previous: "A".into(),
                current: "B".into()
            }
            .payload(),
            b"B"
        );
        assert!(Update::Cleared { previous: "A".into() }.payload().is_empty());
    }
}
