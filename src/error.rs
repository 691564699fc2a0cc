//! Error types for the archive reader and its derived operations.

use std::io;
use thiserror::Error;

use crate::types::Key;

/// Errors surfaced by the archive core and its consumers.
#[derive(Error, Debug)]
pub enum PortalError {
    /// The host archive file could not be opened.
    #[error("failed to open archive {path}: {source}")]
    ArchiveOpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A sector offset could not be sought to.
    #[error("seek to offset {offset:#x} failed: {source}")]
    SeekError {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Fewer bytes were available than a full sector requires.
    #[error("short read at offset {offset:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// A sector chain terminated (or a lookup hit a null child) before the
    /// caller's work was complete.
    #[error("unexpected null pointer: {0}")]
    NullPointer(String),

    /// The on-disk directory structure violates its own invariants.
    #[error("corrupt directory: {0}")]
    CorruptDirectory(String),

    /// The requested key is not present in the directory index.
    #[error("key {0} not found")]
    NotFound(Key),

    /// A record's shape did not match what the consumer expected.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Passthrough for I/O failures not covered by a more specific variant.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, PortalError>;
