//! Error types for payload extraction

use std::io;
use thiserror::Error;

use ota_payload::OperationKind;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Extraction error types
#[derive(Error, Debug)]
pub enum ExtractError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Payload container or manifest error
    #[error(transparent)]
    Payload(#[from] ota_payload::Error),

    /// Binary patch application failed
    #[error("Patch error: {0}")]
    Patch(#[from] ota_patch::PatchError),

    /// A source-dependent operation ran without a configured source image
    #[error("{kind} requires a source image, but none is configured (full mode)")]
    SourceRequired { kind: OperationKind },

    /// The baseline image for a partition is missing
    #[error("Baseline image not found for partition {0}")]
    MissingBaseline(String),

    /// Decompression failed
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// Blob read came up short
    #[error("Truncated blob read: expected {expected} bytes, got {actual}")]
    TruncatedData { expected: u64, actual: u64 },

    /// Context wrapper: which operation of which partition failed
    #[error("Operation {index} on partition {partition} failed")]
    Operation {
        partition: String,
        index: usize,
        #[source]
        source: Box<ExtractError>,
    },

    /// A partition worker task died
    #[error("Worker task panicked: {0}")]
    Worker(String),
}
