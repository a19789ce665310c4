use std::borrow::Cow;

use super::Point;

/// Decoder metadata attached to a symbol
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolMeta {
    /// Symbology version (1-40 for QR Model 2)
    pub version: usize,
    /// Error correction level as reported by the decoder
    pub ecc_level: u16,
    /// Mask pattern (0-7)
    pub mask: u16,
    /// Corner points in image coordinates
    pub corners: [Point; 4],
}

/// One decoded symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Decoded payload bytes, exactly as encoded in the symbol
    pub payload: Vec<u8>,
    /// Decoder metadata
    pub meta: SymbolMeta,
}

impl Symbol {
    /// Create a symbol with default metadata
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            meta: SymbolMeta::default(),
        }
    }

    /// Payload as text for logs and printing; invalid UTF-8 is replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// Attach decoder metadata
    pub fn with_meta(mut self, meta: SymbolMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Outcome of decoding one grayscale frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// No symbol in view
    NoSymbol,
    /// At least one symbol, in decoder order
    Symbols(Vec<Symbol>),
    /// The decoder itself failed (distinct from "nothing found")
    Error(String),
}

impl DecodeResult {
    /// Build a result from decoded symbols; an empty list means `NoSymbol`
    pub fn from_symbols(symbols: Vec<Symbol>) -> Self {
        if symbols.is_empty() {
            DecodeResult::NoSymbol
        } else {
            DecodeResult::Symbols(symbols)
        }
    }

    /// Shorthand for a single-symbol result
    pub fn code(payload: impl Into<Vec<u8>>) -> Self {
        DecodeResult::Symbols(vec![Symbol::new(payload)])
    }

    /// Payload of the first symbol; any further symbols are ignored
    pub fn first_code(&self) -> Option<&[u8]> {
        match self {
            DecodeResult::Symbols(symbols) => symbols.first().map(|s| s.payload.as_slice()),
            DecodeResult::NoSymbol | DecodeResult::Error(_) => None,
        }
    }

    /// Whether the decoder reported a failure
    pub fn is_error(&self) -> bool {
        matches!(self, DecodeResult::Error(_))
    }

    /// Number of symbols found
    pub fn symbol_count(&self) -> usize {
        match self {
            DecodeResult::Symbols(symbols) => symbols.len(),
            _ => 0,
        }
    }
}
