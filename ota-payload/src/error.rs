//! Error types for payload parsing

use thiserror::Error;

/// Result type for payload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Payload parsing error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid payload magic bytes
    #[error("Invalid payload magic: expected 'CrAU', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Truncated data
    #[error("Truncated payload: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: u64, actual: u64 },

    /// Manifest length field exceeds the sanity cap
    #[error("Manifest size {0} exceeds sanity limit")]
    ManifestTooLarge(u64),

    /// Manifest blob rejected by the schema decoder
    #[error("Failed to decode payload manifest: {0}")]
    ManifestDecode(#[from] prost::DecodeError),

    /// Manifest declared a zero block size
    #[error("Manifest block size must be non-zero")]
    InvalidBlockSize,

    /// Unknown operation type tag
    #[error("Unsupported operation type tag: {0}")]
    UnsupportedOperation(i32),

    /// Operation with no destination extents
    #[error("Operation has no destination extents")]
    MissingDstExtents,

    /// Split-write buffer does not cover the destination extents exactly
    #[error("Split write of {actual} bytes does not match extent length {expected}")]
    SplitSizeMismatch { expected: u64, actual: u64 },
}
