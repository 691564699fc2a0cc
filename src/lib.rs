//! Reader for the sector-linked archive format used by a late-1990s MMO
//! client (`PORTAL.DAT` / `CELL.DAT`).
//!
//! The format embeds a small content-addressed file system inside a single
//! host file: fixed-size sectors chained by a `next_pointer` word, and a
//! directory of 32-bit keys organized as a B-tree whose nodes are themselves
//! stored as one or four linked sectors depending on archive dialect.
//!
//! This crate provides the three layers needed to read that format —
//! [`sector::SectorReader`], [`record::RecordReader`], and
//! [`index::DirectoryIndex`] — plus two consumers built on top of them:
//! [`bitmap::BitmapDecoder`] for exporting graphic records as BMP files, and
//! [`map::LandblockAggregator`] for building the world height/type map.

pub mod bitmap;
pub mod config;
pub mod error;
pub mod index;
pub mod map;
pub mod record;
pub mod sector;
pub mod types;

pub use bitmap::BitmapDecoder;
pub use config::RunConfig;
pub use error::{PortalError, Result};
pub use index::DirectoryIndex;
pub use map::{LandblockAggregator, LandblockMap};
pub use record::RecordReader;
pub use sector::SectorReader;
pub use types::{ArchiveDialect, Key, RecordLocator};
