//! CrAU payload envelope parsing
//!
//! The envelope is a fixed big-endian header: magic, format version,
//! manifest length, and (for version 2 and later) a metadata signature
//! length, followed by the manifest blob and the signature blob. Everything
//! after the signature blob is the data blob that operation offsets are
//! relative to.

use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;
use tracing::debug;

use crate::manifest::DeltaArchiveManifest;
use crate::{Error, PAYLOAD_MAGIC, Result};

/// Manifests larger than this are treated as corrupt headers rather than
/// honest payloads.
const MANIFEST_MAX_SIZE: u64 = 64 * 1024 * 1024;

/// Version-dependent tail of the envelope.
///
/// Version 1 payloads do not carry the metadata signature length at all, so
/// the field is modeled as structurally absent instead of zero-valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// No metadata signature section.
    V1,
    /// Version 2 and later: a 4-byte signature length follows the manifest
    /// length.
    V2 { metadata_signature_size: u32 },
}

impl Envelope {
    /// Length of the metadata signature blob that follows the manifest.
    pub fn metadata_signature_size(&self) -> u64 {
        match self {
            Self::V1 => 0,
            Self::V2 {
                metadata_signature_size,
            } => u64::from(*metadata_signature_size),
        }
    }

    fn wire_len(&self) -> u64 {
        // magic + version + manifest length, plus the signature length field
        // when it exists on the wire.
        let fixed = PAYLOAD_MAGIC.len() as u64 + 8 + 8;
        match self {
            Self::V1 => fixed,
            Self::V2 { .. } => fixed + 4,
        }
    }
}

/// Parsed payload header: envelope fields plus the raw manifest blob.
#[derive(Debug, Clone)]
pub struct PayloadHeader {
    /// Declared file format version.
    pub file_format_version: u64,
    /// Version-gated envelope tail.
    pub envelope: Envelope,
    /// Byte offset at which the data blob begins. Operation payload offsets
    /// are relative to this value, never absolute.
    pub data_offset: u64,
    manifest_raw: Vec<u8>,
}

impl PayloadHeader {
    /// Parse the envelope at the reader's current position. After this
    /// returns, the reader is positioned at the start of the data blob.
    pub fn parse<R: Read>(f: &mut R) -> Result<Self> {
        let mut magic = [0u8; PAYLOAD_MAGIC.len()];
        f.read_exact(&mut magic)?;
        if magic != PAYLOAD_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let file_format_version = f.read_u64::<BigEndian>()?;
        let manifest_size = f.read_u64::<BigEndian>()?;
        if manifest_size > MANIFEST_MAX_SIZE {
            return Err(Error::ManifestTooLarge(manifest_size));
        }

        // The signature length exists on the wire only for version > 1.
        let envelope = if file_format_version > 1 {
            Envelope::V2 {
                metadata_signature_size: f.read_u32::<BigEndian>()?,
            }
        } else {
            Envelope::V1
        };

        debug!(
            version = file_format_version,
            manifest_size, "parsed payload envelope"
        );

        let manifest_raw = read_exact_vec(f, manifest_size)?;
        // The signature content is not verified here; it is consumed only to
        // advance to the data blob.
        skip_exact(f, envelope.metadata_signature_size())?;

        let data_offset = envelope.wire_len() + manifest_size + envelope.metadata_signature_size();

        Ok(Self {
            file_format_version,
            envelope,
            data_offset,
            manifest_raw,
        })
    }

    /// Raw manifest bytes, as read from the envelope.
    pub fn manifest_raw(&self) -> &[u8] {
        &self.manifest_raw
    }

    /// Decode the manifest blob. The wire schema is update_engine's
    /// `DeltaArchiveManifest`; decoding is delegated to the schema decoder.
    pub fn manifest(&self) -> Result<DeltaArchiveManifest> {
        DeltaArchiveManifest::decode_blob(&self.manifest_raw)
    }
}

fn read_exact_vec<R: Read>(f: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len as usize);
    let actual = f.by_ref().take(len).read_to_end(&mut buf)? as u64;
    if actual != len {
        return Err(Error::TruncatedData {
            expected: len,
            actual,
        });
    }
    Ok(buf)
}

fn skip_exact<R: Read>(f: &mut R, len: u64) -> Result<()> {
    let actual = std::io::copy(&mut f.by_ref().take(len), &mut std::io::sink())?;
    if actual != len {
        return Err(Error::TruncatedData {
            expected: len,
            actual,
        });
    }
    Ok(())
}
