//! otadump client library
//!
//! This library provides the core functionality for the otadump CLI tool.

pub mod archive;
pub mod commands;
pub mod output;

use clap::Args;
use std::path::PathBuf;

/// Arguments for the `extract` subcommand.
#[derive(Args)]
pub struct ExtractArgs {
    /// OTA package: a raw payload.bin or a .zip containing one
    #[arg(value_name = "FILE")]
    pub payload: PathBuf,

    /// Output directory for reconstructed images
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Full OTA package to reconstruct baseline images from
    /// (enables incremental mode)
    #[arg(short, long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Number of partitions to reconstruct concurrently
    #[arg(long, value_name = "NUMBER")]
    pub concurrency: Option<usize>,
}

/// Arguments for the `list` subcommand.
#[derive(Args)]
pub struct ListArgs {
    /// OTA package: a raw payload.bin or a .zip containing one
    #[arg(value_name = "FILE")]
    pub payload: PathBuf,
}
