//! Error types for the streaming engine.

use thiserror::Error;

/// Error type for dispatcher, codec and processor construction.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid geometry: overlap {overlap} must be smaller than window {window}")]
    InvalidGeometry { window: usize, overlap: usize },

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Did not skip the expected amount of bytes: {skipped} skipped, {expected} expected")]
    Skip { expected: u64, skipped: u64 },

    #[error("Audio device error: {0}")]
    Device(String),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
