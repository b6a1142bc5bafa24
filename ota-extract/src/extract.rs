//! Payload-level orchestration
//!
//! Full mode reconstructs every partition of one payload. Incremental mode
//! first reconstructs the baseline payload into a transient staging
//! directory, then reconstructs the target payload using the staging images
//! as sources. Partitions share no state and run concurrently; operations
//! within one partition stay strictly sequential.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use futures::{StreamExt, stream};
use tokio::task;
use tracing::{debug, info};

use ota_payload::{DeltaArchiveManifest, PartitionUpdate, PayloadHeader};

use crate::partition;
use crate::{ExtractError, Result};

/// Tuning options for payload extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum number of partitions reconstructed concurrently.
    pub concurrency: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            concurrency: thread::available_parallelism().map_or(4, usize::from),
        }
    }
}

/// Name and declared size of one partition, for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSummary {
    pub name: String,
    pub size: Option<u64>,
}

/// Read-only listing projection over a payload's manifest.
pub fn list_partitions(payload_path: &Path) -> Result<Vec<PartitionSummary>> {
    let (_, manifest) = read_payload(payload_path)?;
    Ok(manifest
        .partitions
        .iter()
        .map(|p| PartitionSummary {
            name: p.partition_name.clone(),
            size: p.new_partition_info.as_ref().and_then(|info| info.size),
        })
        .collect())
}

/// Full mode: reconstruct every partition with no source images configured.
pub async fn extract_full(
    payload_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    run_payload(payload_path, output_dir, None, options).await
}

/// Incremental mode: fully reconstruct the baseline payload into a transient
/// staging directory, then reconstruct the target payload against it.
///
/// The staging directory is owned here and removed on every exit path,
/// success or failure.
pub async fn extract_incremental(
    payload_path: &Path,
    baseline_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<()> {
    let staging = tempfile::tempdir()?;
    debug!(
        staging = %staging.path().display(),
        "reconstructing baseline payload into staging"
    );

    // The baseline pass must fully complete before the target pass starts:
    // its images are read-only inputs of the target pass.
    run_payload(baseline_path, staging.path(), None, options).await?;
    run_payload(payload_path, output_dir, Some(staging.path()), options).await
}

fn read_payload(path: &Path) -> Result<(PayloadHeader, DeltaArchiveManifest)> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = PayloadHeader::parse(&mut reader)?;
    let manifest = header.manifest()?;
    Ok((header, manifest))
}

struct PartitionJob {
    payload_path: PathBuf,
    partition: PartitionUpdate,
    block_size: u64,
    data_offset: u64,
    output_dir: PathBuf,
    source_dir: Option<PathBuf>,
}

impl PartitionJob {
    fn run(self) -> Result<PathBuf> {
        let mut payload = BufReader::new(File::open(&self.payload_path)?);
        partition::extract_partition(
            &mut payload,
            &self.partition,
            self.block_size,
            self.data_offset,
            &self.output_dir,
            self.source_dir.as_deref(),
        )
    }
}

/// Reconstruct every partition of one payload into `output_dir`.
async fn run_payload(
    payload_path: &Path,
    output_dir: &Path,
    source_dir: Option<&Path>,
    options: &ExtractOptions,
) -> Result<()> {
    let (header, manifest) = read_payload(payload_path)?;
    let block_size = u64::from(manifest.block_size());

    info!(
        payload = %payload_path.display(),
        partitions = manifest.partitions.len(),
        block_size,
        incremental = source_dir.is_some(),
        "reconstructing payload"
    );

    fs::create_dir_all(output_dir)?;

    let jobs: Vec<PartitionJob> = manifest
        .partitions
        .into_iter()
        .map(|partition| PartitionJob {
            payload_path: payload_path.to_path_buf(),
            partition,
            block_size,
            data_offset: header.data_offset,
            output_dir: output_dir.to_path_buf(),
            source_dir: source_dir.map(Path::to_path_buf),
        })
        .collect();

    // Each job reopens the payload file, so workers never share a file
    // cursor; the destination image is exclusively owned by its job.
    let mut results = stream::iter(jobs)
        .map(|job| task::spawn_blocking(move || job.run()))
        .buffer_unordered(options.concurrency.max(1));

    while let Some(joined) = results.next().await {
        match joined {
            Ok(result) => {
                result?;
            }
            Err(err) => return Err(ExtractError::Worker(err.to_string())),
        }
    }

    Ok(())
}
