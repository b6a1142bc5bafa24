//! update_engine manifest schema
//!
//! The manifest wire format is Android update_engine's protobuf schema
//! (`update_metadata.proto`); the message structs below carry the canonical
//! field tags and decoding is delegated to prost. Nothing in this crate
//! touches protobuf wire bytes directly.

use std::fmt;

use prost::Message;

use crate::{Error, Result};

/// A contiguous run of fixed-size blocks in an image.
#[derive(Clone, PartialEq, Message)]
pub struct Extent {
    #[prost(uint64, optional, tag = "1")]
    pub start_block: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub num_blocks: Option<u64>,
}

impl Extent {
    /// Convenience constructor for manifests built in code.
    pub fn new(start_block: u64, num_blocks: u64) -> Self {
        Self {
            start_block: Some(start_block),
            num_blocks: Some(num_blocks),
        }
    }
}

/// Size and hash of one partition image as declared by the manifest.
///
/// The hash is carried for reporting only; this crate does not verify it.
#[derive(Clone, PartialEq, Message)]
pub struct PartitionInfo {
    #[prost(uint64, optional, tag = "1")]
    pub size: Option<u64>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub hash: Option<Vec<u8>>,
}

/// One edit operation against a partition image.
#[derive(Clone, PartialEq, Message)]
pub struct InstallOperation {
    #[prost(int32, required, tag = "1")]
    pub r#type: i32,
    #[prost(uint64, optional, tag = "2")]
    pub data_offset: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub data_length: Option<u64>,
    #[prost(message, repeated, tag = "4")]
    pub src_extents: Vec<Extent>,
    #[prost(message, repeated, tag = "6")]
    pub dst_extents: Vec<Extent>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub data_sha256_hash: Option<Vec<u8>>,
}

impl InstallOperation {
    /// Resolve the numeric type tag into the closed operation set.
    pub fn kind(&self) -> Result<OperationKind> {
        OperationKind::from_tag(self.r#type)
    }
}

/// One named partition and its ordered operation list.
#[derive(Clone, PartialEq, Message)]
pub struct PartitionUpdate {
    #[prost(string, required, tag = "1")]
    pub partition_name: String,
    #[prost(message, optional, tag = "6")]
    pub old_partition_info: Option<PartitionInfo>,
    #[prost(message, optional, tag = "7")]
    pub new_partition_info: Option<PartitionInfo>,
    #[prost(message, repeated, tag = "8")]
    pub operations: Vec<InstallOperation>,
}

/// Top-level payload manifest.
#[derive(Clone, PartialEq, Message)]
pub struct DeltaArchiveManifest {
    #[prost(uint32, optional, tag = "3", default = "4096")]
    pub block_size: Option<u32>,
    #[prost(uint64, optional, tag = "4")]
    pub signatures_offset: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub signatures_size: Option<u64>,
    #[prost(uint32, optional, tag = "12", default = "0")]
    pub minor_version: Option<u32>,
    #[prost(message, repeated, tag = "13")]
    pub partitions: Vec<PartitionUpdate>,
}

impl DeltaArchiveManifest {
    /// Decode a manifest blob and validate the block-size invariant.
    pub fn decode_blob(buf: &[u8]) -> Result<Self> {
        let manifest = Self::decode(buf)?;
        if manifest.block_size() == 0 {
            return Err(Error::InvalidBlockSize);
        }
        Ok(manifest)
    }
}

/// The closed set of supported operation types.
///
/// The wire tag space is open-ended; anything outside these six is an
/// `UnsupportedOperation` error at the boundary, never a default variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Raw bytes from the data blob.
    Replace,
    /// bzip2-compressed bytes from the data blob.
    ReplaceBz,
    /// XZ/LZMA-compressed bytes from the data blob.
    ReplaceXz,
    /// Copy byte ranges from the source image.
    SourceCopy,
    /// Binary-diff the source image ranges with a blob patch.
    SourceBsdiff,
    /// Zero-fill the destination ranges.
    Zero,
}

impl OperationKind {
    /// Parse an operation from its wire tag.
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Replace),
            3 => Ok(Self::ReplaceBz),
            4 => Ok(Self::SourceCopy),
            5 => Ok(Self::SourceBsdiff),
            6 => Ok(Self::Zero),
            8 => Ok(Self::ReplaceXz),
            other => Err(Error::UnsupportedOperation(other)),
        }
    }

    /// The wire tag for this operation.
    pub fn tag(self) -> i32 {
        match self {
            Self::Replace => 0,
            Self::ReplaceBz => 3,
            Self::SourceCopy => 4,
            Self::SourceBsdiff => 5,
            Self::Zero => 6,
            Self::ReplaceXz => 8,
        }
    }

    /// Whether this operation is legal only when a source image is
    /// configured (incremental mode).
    pub fn needs_source(self) -> bool {
        matches!(self, Self::SourceCopy | Self::SourceBsdiff)
    }

    /// Whether this operation carries payload bytes in the data blob.
    pub fn has_blob_data(self) -> bool {
        matches!(
            self,
            Self::Replace | Self::ReplaceBz | Self::ReplaceXz | Self::SourceBsdiff
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Replace => "REPLACE",
            Self::ReplaceBz => "REPLACE_BZ",
            Self::ReplaceXz => "REPLACE_XZ",
            Self::SourceCopy => "SOURCE_COPY",
            Self::SourceBsdiff => "SOURCE_BSDIFF",
            Self::Zero => "ZERO",
        };
        f.write_str(name)
    }
}
