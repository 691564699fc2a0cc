//! Landblock record parsing and map overlay.

use tracing::warn;

use crate::error::{PortalError, Result};
use crate::map::mapfile::{LandblockMap, MapCell, MAP_SIZE};
use crate::types::Key;

/// Declared byte length every landblock record must have.
pub const LANDBLOCK_RECORD_LENGTH: u32 = 252;
/// Side length of a landblock's terrain sample grid.
const SAMPLE_SIDE: usize = 9;
const SAMPLE_COUNT: usize = SAMPLE_SIDE * SAMPLE_SIDE;

/// A parsed landblock terrain record.
pub struct Landblock {
    /// East-west world index, `0..253`.
    pub x: u8,
    /// North-south world index, `0..253`.
    pub y: u8,
    /// 9×9 terrain type codes, indexed `[col * 9 + row]` (column-major).
    types: [u16; SAMPLE_COUNT],
    /// 9×9 height codes, same indexing as `types`.
    heights: [u8; SAMPLE_COUNT],
}

impl Landblock {
    /// Whether `key` names a candidate landblock entry: low 16 bits are the
    /// `0xFFFF` terrain marker and both world-index bytes are in range.
    pub fn key_is_candidate(key: Key) -> bool {
        if key.low_word() != 0xFFFF {
            return false;
        }
        let x = (key.value() >> 24) as u8;
        let y = (key.value() >> 16) as u8;
        x < 0xFF && y < 0xFF
    }

    /// Parses a 252-byte landblock record. `key` supplies the world
    /// position; the record body supplies the terrain samples.
    pub fn parse(key: Key, data: &[u8]) -> Result<Self> {
        if data.len() != LANDBLOCK_RECORD_LENGTH as usize {
            return Err(PortalError::InvalidRecord(format!(
                "landblock {key}: expected {LANDBLOCK_RECORD_LENGTH} bytes, got {}",
                data.len()
            )));
        }

        let x = (key.value() >> 24) as u8;
        let y = (key.value() >> 16) as u8;

        let mut types = [0u16; SAMPLE_COUNT];
        for (i, t) in types.iter_mut().enumerate() {
            let offset = 8 + i * 2;
            *t = u16::from_le_bytes(data[offset..offset + 2].try_into().unwrap());
        }

        let mut heights = [0u8; SAMPLE_COUNT];
        heights.copy_from_slice(&data[8 + SAMPLE_COUNT * 2..8 + SAMPLE_COUNT * 2 + SAMPLE_COUNT]);

        Ok(Self { x, y, types, heights })
    }

    /// Overlays this landblock's 9×9 samples onto `map`, logging one
    /// diagnostic per cell whose stored `(type, z)` differs from what's
    /// already there. Identical overwrites are silent; this is intentional,
    /// since edges between adjacent landblocks are redundant by
    /// construction.
    pub fn write_into(&self, map: &mut LandblockMap) {
        for col in 0..SAMPLE_SIDE {
            for row in 0..SAMPLE_SIDE {
                let sample = col * SAMPLE_SIDE + row;
                let type_code = self.types[sample];
                let z = self.heights[sample];

                let map_row = MAP_SIZE - 8 * self.y as usize - 1 - row;
                let map_col = 8 * self.x as usize + col;

                let new_cell = MapCell { type_code, z, used: true };
                let previous = map.set(map_row, map_col, new_cell);

                if previous.used && (previous.type_code, previous.z) != (type_code, z) {
                    warn!(
                        row = map_row,
                        col = map_col,
                        old_type = previous.type_code,
                        old_z = previous.z,
                        new_type = type_code,
                        new_z = z,
                        "landblock overwrite changed map cell"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Vec<u8> {
        let mut data = vec![0u8; LANDBLOCK_RECORD_LENGTH as usize];
        // id, object_block_present left zero.
        for i in 0..SAMPLE_COUNT {
            let offset = 8 + i * 2;
            data[offset..offset + 2].copy_from_slice(&0x0041u16.to_le_bytes());
        }
        for i in 0..SAMPLE_COUNT {
            data[8 + SAMPLE_COUNT * 2 + i] = 50;
        }
        data
    }

    #[test]
    fn candidate_filter_matches_expected_conditions() {
        assert!(Landblock::key_is_candidate(Key::new(0x0102_FFFF)));
        assert!(!Landblock::key_is_candidate(Key::new(0x0102_0001))); // wrong low word
        assert!(!Landblock::key_is_candidate(Key::new(0xFF02_FFFF))); // X == 0xFF
        assert!(!Landblock::key_is_candidate(Key::new(0x01FF_FFFF))); // Y == 0xFF
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Landblock::parse(Key::new(0x0102_FFFF), &[0u8; 10]).unwrap_err();
        assert!(matches!(err, PortalError::InvalidRecord(_)));
    }

    #[test]
    fn write_into_places_samples_at_expected_window() {
        let key = Key::new(0x0102_FFFF); // X=1, Y=2
        let landblock = Landblock::parse(key, &sample_record()).unwrap();
        let mut map = LandblockMap::zeroed();
        landblock.write_into(&mut map);

        // X=1, Y=2: rows 2041-16-9..2041-16 (inclusive window), columns 8..16.
        for row in (MAP_SIZE - 16 - 9)..(MAP_SIZE - 16) {
            for col in 8..16 {
                let cell = map.get(row, col);
                assert_eq!(cell.type_code, 0x0041);
                assert_eq!(cell.z, 50);
                assert!(cell.used);
            }
        }
        assert_eq!(map.get(0, 0), MapCell::default());
    }

    #[test]
    fn identical_overwrite_is_silent_and_differing_overwrite_updates() {
        let key = Key::new(0x0000_FFFF);
        let mut map = LandblockMap::zeroed();

        let first = Landblock::parse(key, &sample_record()).unwrap();
        first.write_into(&mut map);

        let mut second_record = sample_record();
        for i in 0..SAMPLE_COUNT {
            second_record[8 + SAMPLE_COUNT * 2 + i] = 99;
        }
        let second = Landblock::parse(key, &second_record).unwrap();
        second.write_into(&mut map);

        let cell = map.get(MAP_SIZE - 1, 0);
        assert_eq!(cell.z, 99);
    }
}
