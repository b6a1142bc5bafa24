//! Locating payload.bin inside an OTA package
//!
//! OTA packages ship either as a raw `payload.bin` or as a zip containing
//! one. Zip inputs are unpacked into a transient directory that lives as
//! long as the handle.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::info;
use zip::ZipArchive;
use zip::result::ZipError;

/// A payload file ready for parsing.
#[derive(Debug)]
pub enum PayloadFile {
    /// The caller's path, used as-is.
    Raw(PathBuf),
    /// `payload.bin` extracted from a zip; the directory is removed when the
    /// handle drops.
    Extracted { path: PathBuf, _tempdir: TempDir },
}

impl PayloadFile {
    /// Open an OTA package. The file is probed as a zip archive first;
    /// anything that is not a zip is treated as a raw payload.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("unable to open file for reading: {}", path.display()))?;

        match ZipArchive::new(file) {
            Ok(mut zip) => {
                let name = zip
                    .file_names()
                    .find(|n| *n == "payload.bin" || n.ends_with("/payload.bin"))
                    .map(str::to_owned)
                    .with_context(|| {
                        format!("payload.bin not found inside {}", path.display())
                    })?;

                info!(archive = %path.display(), entry = %name, "extracting payload.bin");

                let mut entry = zip.by_name(&name)?;
                let tempdir = tempfile::tempdir()?;
                let out_path = tempdir.path().join("payload.bin");
                let mut out = File::create(&out_path)?;
                io::copy(&mut entry, &mut out)?;

                Ok(Self::Extracted {
                    path: out_path,
                    _tempdir: tempdir,
                })
            }
            Err(ZipError::InvalidArchive(_)) => Ok(Self::Raw(path.to_path_buf())),
            Err(err) => Err(err).context("failed to read OTA archive"),
        }
    }

    /// Path of the payload file to parse.
    pub fn path(&self) -> &Path {
        match self {
            Self::Raw(path) => path,
            Self::Extracted { path, .. } => path,
        }
    }
}
