//! The 2041×2041 aggregated height/type map and its flat file format.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;

/// Width and height of the world map, in landblock samples.
pub const MAP_SIZE: usize = 2041;

/// One sampled cell of the world map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapCell {
    pub type_code: u16,
    pub z: u8,
    pub used: bool,
}

/// The full 2041×2041 world map, row-major with row 0 at the north edge.
///
/// This is an owned value threaded through the aggregator rather than the
/// process-wide global the original tooling used.
pub struct LandblockMap {
    cells: Vec<MapCell>,
}

impl LandblockMap {
    /// A fresh, entirely unused map (the `NEWMAP` contract).
    pub fn zeroed() -> Self {
        Self {
            cells: vec![MapCell::default(); MAP_SIZE * MAP_SIZE],
        }
    }

    /// Loads a previously saved map file (the `MERGE` contract's input).
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut cells = Vec::with_capacity(MAP_SIZE * MAP_SIZE);

        for _ in 0..MAP_SIZE * MAP_SIZE {
            let type_code = reader.read_u16::<LittleEndian>()?;
            let z = reader.read_u8()?;
            let used = reader.read_u8()? != 0;
            cells.push(MapCell { type_code, z, used });
        }

        Ok(Self { cells })
    }

    /// Writes the map out in the flat row-major format described above.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        for cell in &self.cells {
            writer.write_u16::<LittleEndian>(cell.type_code)?;
            writer.write_u8(cell.z)?;
            writer.write_u8(u8::from(cell.used))?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Reads the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> MapCell {
        self.cells[row * MAP_SIZE + col]
    }

    /// Writes `cell` at `(row, col)`, returning the previous cell so the
    /// caller can diagnose differing overwrites.
    pub fn set(&mut self, row: usize, col: usize, cell: MapCell) -> MapCell {
        let index = row * MAP_SIZE + col;
        let previous = self.cells[index];
        self.cells[index] = cell;
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn zeroed_map_round_trips_through_save_and_load() {
        let map = LandblockMap::zeroed();
        let file = NamedTempFile::new().unwrap();
        map.save(file.path()).unwrap();

        let bytes = std::fs::metadata(file.path()).unwrap().len();
        assert_eq!(bytes, (MAP_SIZE * MAP_SIZE * 4) as u64);

        let reloaded = LandblockMap::load(file.path()).unwrap();
        assert_eq!(reloaded.get(0, 0), MapCell::default());
        assert_eq!(reloaded.get(MAP_SIZE - 1, MAP_SIZE - 1), MapCell::default());
    }

    #[test]
    fn set_returns_previous_cell() {
        let mut map = LandblockMap::zeroed();
        let first = MapCell { type_code: 0x41, z: 10, used: true };
        let previous = map.set(5, 5, first);
        assert_eq!(previous, MapCell::default());

        let second = MapCell { type_code: 0x99, z: 20, used: true };
        let previous = map.set(5, 5, second);
        assert_eq!(previous, first);
        assert_eq!(map.get(5, 5), second);
    }
}
