//! Run configuration for a single archive operation.
//!
//! Unlike the multi-installation configuration discovery a live game client
//! needs, every driver here opens exactly one host file for the duration of
//! one operation. `RunConfig` is a plain data
//! struct carrying the handful of things a driver needs to know before it
//! opens that file.

use std::path::PathBuf;

use crate::types::ArchiveDialect;

/// Configuration for a single archive operation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the host archive file (`PORTAL.DAT` or `CELL.DAT`).
    pub archive_path: PathBuf,
    /// Which dialect the archive uses.
    pub dialect: ArchiveDialect,
    /// Directory (for batch drivers) or file (for single-target drivers)
    /// that output is written to.
    pub output_path: PathBuf,
}

impl RunConfig {
    pub fn new(archive_path: impl Into<PathBuf>, dialect: ArchiveDialect, output_path: impl Into<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            dialect,
            output_path: output_path.into(),
        }
    }
}
