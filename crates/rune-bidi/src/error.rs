//! Error types for the bidi engine.

use thiserror::Error;

/// Result type for bidi operations.
pub type Result<T> = std::result::Result<T, BidiError>;

/// Errors reported by the bidi engine.
///
/// Every error reflects a caller mistake and is returned from the call
/// that made it; no partial result is produced alongside an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidiError {
    /// Out-of-range paragraph level, unknown mode or option bits.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed explicit levels or an out-of-range index.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Destination buffer cannot hold the worst-case output.
    #[error("buffer too small: need {needed} chars, got {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    /// Query issued before any text was submitted.
    #[error("no paragraph has been set")]
    NotConfigured,
}
