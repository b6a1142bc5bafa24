//! Per-operation reconstruction engine
//!
//! Stateless: each call resolves one operation's strategy from its type tag
//! and applies it against the destination image, optionally consulting a
//! source image. Whether source-dependent operations are legal is decided by
//! the `source` argument alone, never by ambient state.

use std::io::{self, Read, Seek, SeekFrom, Write};

use bzip2::read::BzDecoder;
use tracing::trace;
use xz2::read::XzDecoder;

use ota_payload::{InstallOperation, OperationKind, extent};

use crate::{ExtractError, Result};

/// Apply one operation against the destination image.
///
/// `payload` is the payload file, `data_offset` the start of its data blob.
/// `source` is the baseline image when running in incremental mode.
pub fn apply_operation<P, D, S>(
    payload: &mut P,
    image: &mut D,
    source: Option<&mut S>,
    block_size: u64,
    data_offset: u64,
    op: &InstallOperation,
) -> Result<()>
where
    P: Read + Seek,
    D: Write + Seek,
    S: Read + Seek,
{
    let kind = op.kind()?;
    trace!(%kind, "applying operation");

    match kind {
        OperationKind::Replace => {
            let data = read_blob(payload, data_offset, op)?;
            write_single(image, op, block_size, &data)
        }
        OperationKind::ReplaceBz => {
            let data = read_blob(payload, data_offset, op)?;
            let raw = decompress(BzDecoder::new(data.as_slice()), "bzip2")?;
            write_single(image, op, block_size, &raw)
        }
        OperationKind::ReplaceXz => {
            let data = read_blob(payload, data_offset, op)?;
            let raw = decompress(XzDecoder::new(data.as_slice()), "xz")?;
            write_single(image, op, block_size, &raw)
        }
        OperationKind::SourceCopy => {
            let Some(source) = source else {
                return Err(ExtractError::SourceRequired { kind });
            };
            let buf = extent::read_concat(source, &op.src_extents, block_size)?;
            extent::write_split(image, &op.dst_extents, block_size, &buf)?;
            Ok(())
        }
        OperationKind::SourceBsdiff => {
            let Some(source) = source else {
                return Err(ExtractError::SourceRequired { kind });
            };
            let patch = read_blob(payload, data_offset, op)?;
            let base = extent::read_concat(source, &op.src_extents, block_size)?;
            let target = ota_patch::apply_patch(&base, &patch)?;
            extent::write_split(image, &op.dst_extents, block_size, &target)?;
            Ok(())
        }
        OperationKind::Zero => {
            for range in extent::resolve(&op.dst_extents, block_size) {
                image.seek(SeekFrom::Start(range.offset))?;
                io::copy(&mut io::repeat(0).take(range.length), image)?;
            }
            Ok(())
        }
    }
}

/// Read exactly `data_length` blob bytes for `op`.
fn read_blob<P: Read + Seek>(
    payload: &mut P,
    data_offset: u64,
    op: &InstallOperation,
) -> Result<Vec<u8>> {
    let length = op.data_length();
    payload.seek(SeekFrom::Start(data_offset + op.data_offset()))?;

    let mut buf = Vec::with_capacity(length as usize);
    let actual = payload.by_ref().take(length).read_to_end(&mut buf)? as u64;
    if actual != length {
        return Err(ExtractError::TruncatedData {
            expected: length,
            actual,
        });
    }
    Ok(buf)
}

/// Write `data` verbatim at the single destination extent's byte offset.
fn write_single<D: Write + Seek>(
    image: &mut D,
    op: &InstallOperation,
    block_size: u64,
    data: &[u8],
) -> Result<()> {
    let extent = op
        .dst_extents
        .first()
        .ok_or(ota_payload::Error::MissingDstExtents)?;
    image.seek(SeekFrom::Start(extent.start_block() * block_size))?;
    image.write_all(data)?;
    Ok(())
}

/// Run a streaming decompressor to completion.
fn decompress<R: Read>(mut decoder: R, codec: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Decompression(format!("{codec}: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    use ota_payload::Extent;

    const BLOCK: u64 = 4;

    fn op(kind: OperationKind) -> InstallOperation {
        InstallOperation {
            r#type: kind.tag(),
            ..Default::default()
        }
    }

    fn apply(
        blob: &[u8],
        image: &mut Cursor<Vec<u8>>,
        source: Option<&mut Cursor<Vec<u8>>>,
        operation: &InstallOperation,
    ) -> Result<()> {
        let mut payload = Cursor::new(blob.to_vec());
        apply_operation(&mut payload, image, source, BLOCK, 0, operation)
    }

    #[test]
    fn replace_writes_verbatim() {
        let mut operation = op(OperationKind::Replace);
        operation.data_offset = Some(0);
        operation.data_length = Some(8);
        operation.dst_extents = vec![Extent::new(2, 2)];

        let mut image = Cursor::new(vec![0u8; 16]);
        apply(b"ABCDEFGH", &mut image, None::<&mut Cursor<Vec<u8>>>, &operation).unwrap();

        let out = image.into_inner();
        assert_eq!(&out[8..16], b"ABCDEFGH");
        assert!(out[..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn replace_accepts_zero_length() {
        let mut operation = op(OperationKind::Replace);
        operation.data_offset = Some(0);
        operation.data_length = Some(0);
        operation.dst_extents = vec![Extent::new(0, 0)];

        let mut image = Cursor::new(vec![0xEEu8; 4]);
        apply(b"", &mut image, None::<&mut Cursor<Vec<u8>>>, &operation).unwrap();
        assert_eq!(image.into_inner(), vec![0xEE; 4]);
    }

    #[test]
    fn replace_bz_round_trips() {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;

        let raw = b"compressed payload body!";
        let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(raw).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut operation = op(OperationKind::ReplaceBz);
        operation.data_offset = Some(0);
        operation.data_length = Some(compressed.len() as u64);
        operation.dst_extents = vec![Extent::new(0, 6)];

        let mut image = Cursor::new(vec![0u8; 24]);
        apply(
            &compressed,
            &mut image,
            None::<&mut Cursor<Vec<u8>>>,
            &operation,
        )
        .unwrap();
        assert_eq!(image.into_inner(), raw.to_vec());
    }

    #[test]
    fn replace_xz_round_trips() {
        use xz2::write::XzEncoder;

        let raw = b"xz compressed payload body..";
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(raw).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut operation = op(OperationKind::ReplaceXz);
        operation.data_offset = Some(0);
        operation.data_length = Some(compressed.len() as u64);
        operation.dst_extents = vec![Extent::new(0, 7)];

        let mut image = Cursor::new(vec![0u8; 28]);
        apply(
            &compressed,
            &mut image,
            None::<&mut Cursor<Vec<u8>>>,
            &operation,
        )
        .unwrap();
        assert_eq!(image.into_inner(), raw.to_vec());
    }

    #[test]
    fn corrupt_bz_stream_is_a_codec_error() {
        let mut operation = op(OperationKind::ReplaceBz);
        operation.data_offset = Some(0);
        operation.data_length = Some(4);
        operation.dst_extents = vec![Extent::new(0, 1)];

        let mut image = Cursor::new(vec![0u8; 4]);
        let err = apply(
            b"\xDE\xAD\xBE\xEF",
            &mut image,
            None::<&mut Cursor<Vec<u8>>>,
            &operation,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::Decompression(_)));
    }

    #[test]
    fn zero_fills_each_extent() {
        let mut operation = op(OperationKind::Zero);
        operation.dst_extents = vec![Extent::new(0, 1), Extent::new(3, 1)];

        let mut image = Cursor::new(vec![0xFFu8; 16]);
        apply(b"", &mut image, None::<&mut Cursor<Vec<u8>>>, &operation).unwrap();

        let out = image.into_inner();
        assert!(out[0..4].iter().all(|&b| b == 0));
        assert!(out[4..12].iter().all(|&b| b == 0xFF));
        assert!(out[12..16].iter().all(|&b| b == 0));
    }

    #[test]
    fn source_copy_pipes_concat_to_split() {
        // Source blocks: [AAAA BBBB CCCC DDDD]
        let source_bytes: Vec<u8> = [b'A', b'B', b'C', b'D']
            .iter()
            .flat_map(|&c| [c; 4])
            .collect();
        let mut source = Cursor::new(source_bytes);

        let mut operation = op(OperationKind::SourceCopy);
        operation.src_extents = vec![Extent::new(2, 1), Extent::new(0, 2)];
        operation.dst_extents = vec![Extent::new(0, 2), Extent::new(4, 1)];

        let mut image = Cursor::new(vec![0u8; 24]);
        apply(b"", &mut image, Some(&mut source), &operation).unwrap();

        let out = image.into_inner();
        // Concatenated source stream is CCCC AAAA BBBB; the first two blocks
        // land at dst block 0, the last at dst block 4.
        assert_eq!(&out[0..8], b"CCCCAAAA");
        assert_eq!(&out[16..20], b"BBBB");
        assert!(out[8..16].iter().all(|&b| b == 0));
    }

    #[test]
    fn source_copy_without_source_is_a_mode_error() {
        let mut operation = op(OperationKind::SourceCopy);
        operation.src_extents = vec![Extent::new(0, 1)];
        operation.dst_extents = vec![Extent::new(0, 1)];

        let mut image = Cursor::new(vec![0u8; 4]);
        let err = apply(b"", &mut image, None::<&mut Cursor<Vec<u8>>>, &operation).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::SourceRequired {
                kind: OperationKind::SourceCopy
            }
        ));
        // Nothing was written.
        assert_eq!(image.into_inner(), vec![0u8; 4]);
    }

    #[test]
    fn source_bsdiff_reconstructs_across_uneven_extents() {
        // Base lives in two non-contiguous source ranges of differing sizes.
        let base: Vec<u8> = (0u8..12).collect();
        let mut source_image = vec![0u8; 32];
        source_image[4..12].copy_from_slice(&base[0..8]); // blocks 1-2
        source_image[20..24].copy_from_slice(&base[8..12]); // block 5
        let mut source = Cursor::new(source_image);

        let target: Vec<u8> = (100u8..112).collect();
        let patch = ota_patch::create_patch(&base, &target).unwrap();

        let mut operation = op(OperationKind::SourceBsdiff);
        operation.data_offset = Some(0);
        operation.data_length = Some(patch.len() as u64);
        operation.src_extents = vec![Extent::new(1, 2), Extent::new(5, 1)];
        // Destination split 1 block + 2 blocks; boundaries must come from
        // cumulative block counts.
        operation.dst_extents = vec![Extent::new(7, 1), Extent::new(2, 2)];

        let mut image = Cursor::new(vec![0u8; 32]);
        apply(&patch, &mut image, Some(&mut source), &operation).unwrap();

        let out = image.into_inner();
        assert_eq!(&out[28..32], &target[0..4]);
        assert_eq!(&out[8..16], &target[4..12]);
    }

    #[test]
    fn source_bsdiff_without_source_is_a_mode_error() {
        let mut operation = op(OperationKind::SourceBsdiff);
        operation.data_offset = Some(0);
        operation.data_length = Some(4);
        operation.src_extents = vec![Extent::new(0, 1)];
        operation.dst_extents = vec![Extent::new(0, 1)];

        let mut image = Cursor::new(vec![0u8; 4]);
        let err = apply(
            b"\x00\x00\x00\x00",
            &mut image,
            None::<&mut Cursor<Vec<u8>>>,
            &operation,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::SourceRequired {
                kind: OperationKind::SourceBsdiff
            }
        ));
    }

    #[test]
    fn unknown_tag_fails_before_any_write() {
        let operation = InstallOperation {
            r#type: 99,
            dst_extents: vec![Extent::new(0, 1)],
            ..Default::default()
        };

        let mut image = Cursor::new(vec![0xAAu8; 4]);
        let err = apply(b"", &mut image, None::<&mut Cursor<Vec<u8>>>, &operation).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Payload(ota_payload::Error::UnsupportedOperation(99))
        ));
        assert_eq!(image.into_inner(), vec![0xAA; 4]);
    }

    #[test]
    fn truncated_blob_is_reported() {
        let mut operation = op(OperationKind::Replace);
        operation.data_offset = Some(0);
        operation.data_length = Some(100);
        operation.dst_extents = vec![Extent::new(0, 25)];

        let mut image = Cursor::new(Vec::new());
        let err = apply(
            b"only a few bytes",
            &mut image,
            None::<&mut Cursor<Vec<u8>>>,
            &operation,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::TruncatedData {
                expected: 100,
                actual: 16
            }
        ));
    }
}
