//! Error types for glyphrun
//!
//! The layout core favors total functions: fallback resolution and empty
//! ranges never fail. The variants here cover the explicit precondition
//! checks (range and buffer-length contracts) and failures reported by the
//! external font and shaping collaborators.

use thiserror::Error;

/// Result type alias for glyphrun operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for glyphrun.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A layout or measurement range does not fit inside its buffer.
    #[error("invalid range: start {start} + count {count} exceeds buffer of {buf_size}")]
    InvalidRange {
        start: usize,
        count: usize,
        buf_size: usize,
    },

    /// A caller-provided advances buffer has the wrong length.
    #[error("advance buffer holds {actual} slots, layout range needs {expected}")]
    AdvanceBufferMismatch { expected: usize, actual: usize },

    /// A font collection was constructed without any usable font.
    #[error("font collection needs at least one family with at least one font")]
    EmptyCollection,

    /// An encoded-text symbol id falls outside the codebook.
    #[error("symbol id {symbol} is outside the codebook range 0..{len}")]
    InvalidSymbol { symbol: u8, len: usize },

    /// Font data could not be parsed into a face.
    #[error("font face could not be parsed: {reason}")]
    FaceParsing { reason: String },

    /// The shaping collaborator failed.
    #[error("shaping failed: {reason}")]
    Shaping { reason: String },
}
