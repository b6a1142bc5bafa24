//! Partition image reconstruction from update-engine payloads
//!
//! Given a parsed payload (envelope + manifest + data blob), this crate
//! rebuilds the raw partition images: a stateless per-operation engine, a
//! strictly ordered per-partition reconstructor, and an orchestrator that
//! runs partitions concurrently and handles the two-pass incremental flow.

pub mod engine;
pub mod error;
pub mod extract;
pub mod partition;

pub use error::{ExtractError, Result};
pub use extract::{
    ExtractOptions, PartitionSummary, extract_full, extract_incremental, list_partitions,
};
pub use partition::extract_partition;
