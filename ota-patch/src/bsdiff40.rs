//! BSDIFF40 patch format implementation
//!
//! Based on bsdiff by Colin Percival with bzip2 compression

use std::io::{Cursor, Read, Write};

use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use tracing::{debug, trace};

use crate::error::{PatchError, Result};

/// BSDIFF40 magic signature
const BSDIFF40_MAGIC: [u8; 8] = *b"BSDIFF40";

/// BSDIFF40 patch header
///
/// All three length fields use bsdiff's sign-magnitude 64-bit encoding:
/// little-endian magnitude with the sign in the top bit of the last byte.
#[derive(Debug, Clone)]
pub struct BsdiffHeader {
    /// Control block size (compressed)
    pub ctrl_size: i64,
    /// Diff block size (compressed)
    pub diff_size: i64,
    /// Output file size
    pub new_size: i64,
}

impl BsdiffHeader {
    /// Read header from stream
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if magic != BSDIFF40_MAGIC {
            return Err(PatchError::InvalidMagic(magic));
        }

        let ctrl_size = read_off(reader)?;
        let diff_size = read_off(reader)?;
        let new_size = read_off(reader)?;

        if ctrl_size < 0 || diff_size < 0 || new_size < 0 {
            return Err(PatchError::CorruptPatch(
                "Invalid sizes in patch header".to_string(),
            ));
        }

        Ok(Self {
            ctrl_size,
            diff_size,
            new_size,
        })
    }

    /// Write header to stream
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&BSDIFF40_MAGIC)?;
        write_off(writer, self.ctrl_size)?;
        write_off(writer, self.diff_size)?;
        write_off(writer, self.new_size)?;
        Ok(())
    }
}

/// Read a sign-magnitude encoded 64-bit value.
fn read_off<R: Read>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;

    let mut y = i64::from(buf[7] & 0x7f);
    for i in (0..7).rev() {
        y = (y << 8) | i64::from(buf[i]);
    }

    Ok(if buf[7] & 0x80 != 0 { -y } else { y })
}

/// Write a sign-magnitude encoded 64-bit value.
fn write_off<W: Write>(writer: &mut W, x: i64) -> Result<()> {
    let mut y = x.unsigned_abs();
    let mut buf = [0u8; 8];
    for b in &mut buf {
        *b = (y & 0xff) as u8;
        y >>= 8;
    }
    if x < 0 {
        buf[7] |= 0x80;
    }
    writer.write_all(&buf)?;
    Ok(())
}

/// Apply a BSDIFF40 patch to original data
pub fn apply_patch(original: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    debug!(
        "Applying BSDIFF40 patch: original={} bytes, patch={} bytes",
        original.len(),
        patch.len()
    );

    let mut cursor = Cursor::new(patch);

    let header = BsdiffHeader::read(&mut cursor)?;
    trace!("Patch header: {:?}", header);

    let control_block = read_compressed_block(&mut cursor, header.ctrl_size as usize)?;
    let diff_block = read_compressed_block(&mut cursor, header.diff_size as usize)?;

    // Remaining data is the extra block
    let mut extra_compressed = Vec::new();
    cursor.read_to_end(&mut extra_compressed)?;
    let extra_block = decompress_block(&extra_compressed)?;

    let result = apply_patch_blocks(
        original,
        &control_block,
        &diff_block,
        &extra_block,
        header.new_size as usize,
    )?;

    debug!("Patch applied successfully: output={} bytes", result.len());
    Ok(result)
}

/// Read and decompress a block from the patch
fn read_compressed_block<R: Read>(reader: &mut R, size: usize) -> Result<Vec<u8>> {
    let mut compressed = vec![0u8; size];
    reader.read_exact(&mut compressed)?;
    decompress_block(&compressed)
}

/// Decompress a bzip2 block
fn decompress_block(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = BzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| PatchError::DecompressionError(e.to_string()))?;

    Ok(decompressed)
}

/// Apply patch using control, diff, and extra blocks
fn apply_patch_blocks(
    original: &[u8],
    control: &[u8],
    diff: &[u8],
    extra: &[u8],
    new_size: usize,
) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(new_size);
    let mut control_cursor = Cursor::new(control);
    let mut diff_cursor = Cursor::new(diff);
    let mut extra_cursor = Cursor::new(extra);
    let mut old_pos = 0usize;

    while output.len() < new_size {
        // Read control triple
        let add_size = read_off(&mut control_cursor)?;
        let copy_size = read_off(&mut control_cursor)?;
        let seek_amount = read_off(&mut control_cursor)?;

        if add_size < 0 || copy_size < 0 {
            return Err(PatchError::CorruptPatch(
                "Negative length in control block".to_string(),
            ));
        }
        let add_size = add_size as usize;
        let copy_size = copy_size as usize;

        // Sanity check
        if output.len() + add_size + copy_size > new_size {
            return Err(PatchError::CorruptPatch(
                "Patch would exceed output size".to_string(),
            ));
        }

        // Add diff bytes to the corresponding original bytes
        let mut diff_data = vec![0u8; add_size];
        diff_cursor.read_exact(&mut diff_data)?;
        for diff_byte in diff_data {
            let old_byte = if old_pos < original.len() {
                original[old_pos]
            } else {
                0
            };
            output.push(old_byte.wrapping_add(diff_byte));
            old_pos += 1;
        }

        // Copy extra block
        let mut extra_data = vec![0u8; copy_size];
        extra_cursor.read_exact(&mut extra_data)?;
        output.extend_from_slice(&extra_data);

        // Seek in old file
        if seek_amount < 0 {
            old_pos = old_pos.saturating_sub((-seek_amount) as usize);
        } else {
            old_pos = old_pos.saturating_add(seek_amount as usize);
        }
    }

    if output.len() != new_size {
        return Err(PatchError::SizeMismatch {
            expected: new_size,
            actual: output.len(),
        });
    }

    Ok(output)
}

/// Create a BSDIFF40 patch between original and modified data
///
/// Note: This is a simplified implementation for testing.
/// A full implementation would include suffix array construction
/// and optimal diff/extra block generation.
pub fn create_patch(original: &[u8], modified: &[u8]) -> Result<Vec<u8>> {
    debug!(
        "Creating BSDIFF40 patch: original={} bytes, modified={} bytes",
        original.len(),
        modified.len()
    );

    // Simple strategy: one control triple, everything as extra data.
    let mut control = Vec::new();
    write_off(&mut control, 0)?; // add_size
    write_off(&mut control, modified.len() as i64)?; // copy_size
    write_off(&mut control, 0)?; // seek_amount

    let control_compressed = compress_block(&control)?;
    let diff_compressed = compress_block(&[])?;
    let extra_compressed = compress_block(modified)?;

    let mut patch = Vec::new();

    let header = BsdiffHeader {
        ctrl_size: control_compressed.len() as i64,
        diff_size: diff_compressed.len() as i64,
        new_size: modified.len() as i64,
    };

    header.write(&mut patch)?;
    patch.extend_from_slice(&control_compressed);
    patch.extend_from_slice(&diff_compressed);
    patch.extend_from_slice(&extra_compressed);

    debug!("Patch created: {} bytes", patch.len());
    Ok(patch)
}

/// Compress a block using bzip2
fn compress_block(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
