//! Error types for patch operations

use thiserror::Error;

/// Result type for patch operations
pub type Result<T> = std::result::Result<T, PatchError>;

/// Errors that can occur during patch operations
#[derive(Error, Debug)]
pub enum PatchError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid patch magic bytes
    #[error("Invalid patch magic: expected 'BSDIFF40', got {0:?}")]
    InvalidMagic([u8; 8]),

    /// Corrupt patch data
    #[error("Corrupt patch data: {0}")]
    CorruptPatch(String),

    /// Size mismatch
    #[error("Size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    /// Decompression error
    #[error("Decompression error: {0}")]
    DecompressionError(String),
}
