//! Block-extent resolution and multi-extent image I/O
//!
//! Extents address images purely in block units. A sequence of extents is a
//! logical concatenation: reads and writes walk the list in order, each
//! extent contributing exactly `num_blocks * block_size` bytes.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::manifest::Extent;
use crate::{Error, Result};

/// One extent resolved to absolute byte coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

/// Resolve block-addressed extents into absolute byte ranges.
pub fn resolve(extents: &[Extent], block_size: u64) -> Vec<ByteRange> {
    extents
        .iter()
        .map(|e| ByteRange {
            offset: e.start_block() * block_size,
            length: e.num_blocks() * block_size,
        })
        .collect()
}

/// Total byte length covered by a list of extents.
pub fn total_bytes(extents: &[Extent], block_size: u64) -> u64 {
    extents.iter().map(|e| e.num_blocks() * block_size).sum()
}

/// Read every extent from `source` in listed order into one buffer.
pub fn read_concat<R: Read + Seek>(
    source: &mut R,
    extents: &[Extent],
    block_size: u64,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(total_bytes(extents, block_size) as usize);
    for range in resolve(extents, block_size) {
        source.seek(SeekFrom::Start(range.offset))?;
        let start = buf.len();
        buf.resize(start + range.length as usize, 0);
        source.read_exact(&mut buf[start..])?;
    }
    Ok(buf)
}

/// Split `buf` across `extents` in listed order and write each chunk at its
/// extent's byte offset.
///
/// Chunk boundaries are the running sum of each extent's own
/// `num_blocks * block_size` — never derived from `start_block`.
pub fn write_split<W: Write + Seek>(
    image: &mut W,
    extents: &[Extent],
    block_size: u64,
    buf: &[u8],
) -> Result<()> {
    let expected = total_bytes(extents, block_size);
    if buf.len() as u64 != expected {
        return Err(Error::SplitSizeMismatch {
            expected,
            actual: buf.len() as u64,
        });
    }

    let mut consumed = 0usize;
    for range in resolve(extents, block_size) {
        let next = consumed + range.length as usize;
        image.seek(SeekFrom::Start(range.offset))?;
        image.write_all(&buf[consumed..next])?;
        consumed = next;
    }
    Ok(())
}
