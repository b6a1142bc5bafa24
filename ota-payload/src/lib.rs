//! Android update-engine payload container parsing
//!
//! A payload is a self-describing archive: a fixed CrAU envelope, a protobuf
//! manifest describing per-partition edit operations, and a trailing data
//! blob the operations index into. This crate parses the envelope, exposes
//! the manifest schema, and resolves block-addressed extents into byte
//! ranges.

pub mod envelope;
pub mod error;
pub mod extent;
pub mod manifest;

pub use envelope::{Envelope, PayloadHeader};
pub use error::{Error, Result};
pub use extent::ByteRange;
pub use manifest::{
    DeltaArchiveManifest, Extent, InstallOperation, OperationKind, PartitionInfo, PartitionUpdate,
};

/// Payload magic bytes
pub const PAYLOAD_MAGIC: [u8; 4] = *b"CrAU";
