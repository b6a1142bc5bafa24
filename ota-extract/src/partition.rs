//! Per-partition image reconstruction
//!
//! One destination image per partition, operations applied strictly in
//! manifest order. Later operations may overwrite earlier writes at the same
//! offsets; there is no coalescing and no reordering.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ota_payload::PartitionUpdate;

use crate::engine;
use crate::{ExtractError, Result};

/// Destination filename for a partition image.
pub fn image_path(dir: &Path, partition_name: &str) -> PathBuf {
    dir.join(format!("{partition_name}.img"))
}

/// Reconstruct one partition image into `output_dir`.
///
/// In incremental mode `source_dir` names the directory holding the baseline
/// images; a missing baseline file is an error, never a silent skip. On any
/// operation failure the partial image is left on disk for diagnosis.
pub fn extract_partition<P: Read + Seek>(
    payload: &mut P,
    partition: &PartitionUpdate,
    block_size: u64,
    data_offset: u64,
    output_dir: &Path,
    source_dir: Option<&Path>,
) -> Result<PathBuf> {
    let name = &partition.partition_name;
    info!(
        partition = %name,
        operations = partition.operations.len(),
        "extracting partition"
    );

    let dest_path = image_path(output_dir, name);
    let mut image = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&dest_path)?;

    let mut source = match source_dir {
        Some(dir) => {
            let path = image_path(dir, name);
            let file = File::open(&path).map_err(|err| {
                if err.kind() == io::ErrorKind::NotFound {
                    ExtractError::MissingBaseline(name.clone())
                } else {
                    ExtractError::Io(err)
                }
            })?;
            Some(file)
        }
        None => None,
    };

    for (index, op) in partition.operations.iter().enumerate() {
        debug!(partition = %name, index, "applying operation");
        engine::apply_operation(
            payload,
            &mut image,
            source.as_mut(),
            block_size,
            data_offset,
            op,
        )
        .map_err(|err| ExtractError::Operation {
            partition: name.clone(),
            index,
            source: Box::new(err),
        })?;
    }

    Ok(dest_path)
}
