//! Binary patch application for incremental OTA payloads
//!
//! This crate implements the BSDIFF40 patch format used by update-engine
//! SOURCE_BSDIFF operations: a fixed header followed by three
//! bzip2-compressed blocks (control, diff, extra).

pub mod bsdiff40;
pub mod error;

pub use bsdiff40::{BsdiffHeader, apply_patch, create_patch};
pub use error::{PatchError, Result};
