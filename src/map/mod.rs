//! Landblock terrain scanning and world map aggregation.

mod landblock;
mod mapfile;

use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;
use crate::index::DirectoryIndex;
use crate::record::RecordReader;
use crate::sector::SectorReader;

pub use landblock::{Landblock, LANDBLOCK_RECORD_LENGTH};
pub use mapfile::{LandblockMap, MapCell, MAP_SIZE};

/// Walks a CELL archive's directory and overlays every landblock record it
/// finds onto a [`LandblockMap`].
pub struct LandblockAggregator;

impl LandblockAggregator {
    /// `NEWMAP` mode: writes a zero-filled map file and returns, without
    /// touching any archive.
    pub fn new_map(map_path: &Path) -> Result<()> {
        info!(path = %map_path.display(), "writing zeroed map file");
        LandblockMap::zeroed().save(map_path)
    }

    /// `MERGE` mode: loads the existing map file, traverses `sectors`' tree
    /// rooted at `root` overlaying every landblock found, then rewrites the
    /// map file. Returns the number of landblocks written.
    pub fn merge(sectors: &mut SectorReader, root: u64, map_path: &Path) -> Result<usize> {
        let mut map = LandblockMap::load(map_path)?;
        let written = Self::overlay(sectors, root, &mut map)?;
        map.save(map_path)?;
        info!(landblocks = written, path = %map_path.display(), "merged landblocks into map");
        Ok(written)
    }

    /// Traverses the directory and overlays every matching landblock onto
    /// an in-memory map, without reading or writing a map file. Exposed
    /// separately from [`Self::merge`] so callers that already hold a map
    /// (e.g. chaining multiple archives) can reuse it.
    pub fn overlay(sectors: &mut SectorReader, root: u64, map: &mut LandblockMap) -> Result<usize> {
        let hits = DirectoryIndex::new(sectors, root).enumerate_suffix_mask(0xFFFF)?;
        let mut written = 0;

        for (key, locator) in hits {
            if !Landblock::key_is_candidate(key) || locator.length != LANDBLOCK_RECORD_LENGTH {
                continue;
            }

            let record = RecordReader::read(sectors, locator.offset, locator.length)?;
            let landblock = Landblock::parse(key, &record)?;
            landblock.write_into(map);
            written += 1;
            debug!(key = %key, x = landblock.x, y = landblock.y, "wrote landblock");
        }

        Ok(written)
    }
}
