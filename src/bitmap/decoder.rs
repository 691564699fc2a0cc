//! Decodes graphic records into 24-bit bitmaps.

use std::fmt;
use std::path::Path;

use tracing::warn;

use crate::bitmap::bmp::write_bmp;
use crate::error::{PortalError, Result};
use crate::index::DirectoryIndex;
use crate::record::RecordReader;
use crate::sector::SectorReader;
use crate::types::Key;

/// Record type prefix for palettized texture records.
const PALETTIZED_PREFIX: u8 = 0x05;
/// Record type prefix for direct-color UI bitmap records.
const DIRECT_COLOR_PREFIX: u8 = 0x06;
/// `image_type` value meaning "8-bit palettized".
const IMAGE_TYPE_PALETTIZED: u32 = 2;
/// `image_type` value meaning "unspecified format" (silently skipped).
const IMAGE_TYPE_UNSPECIFIED: u32 = 4;

/// One line of the export manifest: which source record (and, for
/// palettized textures, which palette) produced which output file.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub index: u32,
    pub source_key: Key,
    pub palette_key: Key,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.index, self.source_key, self.palette_key, self.width, self.height
        )
    }
}

/// Exports every `0x05` (palettized) and `0x06` (direct-color) graphic
/// record reachable from a directory root as a standalone BMP file.
pub struct BitmapDecoder;

impl BitmapDecoder {
    /// Runs both export passes, writing `gr%04d.bmp` files to `out_dir` and
    /// returning one manifest line per emission, in emission order.
    ///
    /// A record-level failure (truncated record, missing palette) is logged
    /// and the record is skipped; it does not abort the overall pass.
    pub fn export_all(sectors: &mut SectorReader, root: u64, out_dir: &Path) -> Result<Vec<ManifestEntry>> {
        std::fs::create_dir_all(out_dir)?;

        let (palettized_hits, direct_color_hits) = {
            let mut index = DirectoryIndex::new(sectors, root);
            (index.enumerate_prefix(PALETTIZED_PREFIX)?, index.enumerate_prefix(DIRECT_COLOR_PREFIX)?)
        };

        let mut manifest = Vec::new();
        let mut counter = 0u32;

        for (key, locator) in palettized_hits {
            match Self::export_palettized(sectors, root, key, locator, &mut counter, out_dir) {
                Ok(Some(entry)) => manifest.push(entry),
                Ok(None) => {}
                Err(err) => warn!(key = %key, error = %err, "skipping palettized record"),
            }
        }

        for (key, locator) in direct_color_hits {
            match Self::export_direct_color(sectors, locator, key, &mut counter, out_dir) {
                Ok(entry) => manifest.push(entry),
                Err(err) => warn!(key = %key, error = %err, "skipping direct-color record"),
            }
        }

        Ok(manifest)
    }

    fn export_palettized(
        sectors: &mut SectorReader,
        root: u64,
        key: Key,
        locator: crate::types::RecordLocator,
        counter: &mut u32,
        out_dir: &Path,
    ) -> Result<Option<ManifestEntry>> {
        let record = RecordReader::read(sectors, locator.offset, locator.length)?;
        let graphic = PalettizedGraphic::parse(key, &record)?;

        match graphic.image_type {
            IMAGE_TYPE_PALETTIZED => {}
            IMAGE_TYPE_UNSPECIFIED => return Ok(None),
            _ => return Ok(None),
        }

        let palette_key = Key::new(graphic.palette_key);
        let palette_locator = DirectoryIndex::new(sectors, root).locate(palette_key)?;
        let palette = RecordReader::read(sectors, palette_locator.offset, palette_locator.length)?;

        let pixels = graphic.decode(&record, &palette)?;
        let path = out_dir.join(format!("gr{counter:04}.bmp"));
        write_bmp(&path, graphic.width, graphic.height, &pixels)?;

        let entry = ManifestEntry {
            index: *counter,
            source_key: key,
            palette_key,
            width: graphic.width,
            height: graphic.height,
        };
        *counter += 1;
        Ok(Some(entry))
    }

    fn export_direct_color(
        sectors: &mut SectorReader,
        locator: crate::types::RecordLocator,
        key: Key,
        counter: &mut u32,
        out_dir: &Path,
    ) -> Result<ManifestEntry> {
        let record = RecordReader::read(sectors, locator.offset, locator.length)?;
        let graphic = DirectColorGraphic::parse(key, &record)?;
        let pixels = graphic.decode(&record)?;

        let path = out_dir.join(format!("gr{counter:04}.bmp"));
        write_bmp(&path, graphic.width, graphic.height, &pixels)?;

        let entry = ManifestEntry {
            index: *counter,
            source_key: key,
            palette_key: Key::new(0),
            width: graphic.width,
            height: graphic.height,
        };
        *counter += 1;
        Ok(entry)
    }
}

/// Header fields of a `0x05`-prefixed palettized graphic record.
struct PalettizedGraphic {
    width: u32,
    height: u32,
    image_type: u32,
    palette_key: u32,
}

impl PalettizedGraphic {
    fn parse(key: Key, data: &[u8]) -> Result<Self> {
        if data.len() < 16 {
            return Err(PortalError::InvalidRecord(format!(
                "palettized record {key}: header truncated ({} bytes)",
                data.len()
            )));
        }

        let image_type = read_u32(data, 4);
        let width = read_u32(data, 8);
        let height = read_u32(data, 12);

        let indices_len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| PortalError::InvalidRecord(format!("palettized record {key}: dimensions overflow")))?;

        let palette_list_offset = 16 + round_up_to_word(indices_len);
        if data.len() < palette_list_offset + 4 {
            return Err(PortalError::InvalidRecord(format!(
                "palettized record {key}: no palette reference present"
            )));
        }
        let palette_key = read_u32(data, palette_list_offset);

        Ok(Self {
            width,
            height,
            image_type,
            palette_key,
        })
    }

    /// Decodes to top-down B,G,R rows, suitable for [`write_bmp`].
    fn decode(&self, record: &[u8], palette: &[u8]) -> Result<Vec<u8>> {
        let indices = &record[16..16 + (self.width * self.height) as usize];
        let mut out = Vec::with_capacity(indices.len() * 3);
        for &idx in indices {
            let base = 8 + 4 * idx as usize;
            if palette.len() < base + 3 {
                return Err(PortalError::InvalidRecord(format!(
                    "palette too short for index {idx} (needs {} bytes, has {})",
                    base + 3,
                    palette.len()
                )));
            }
            out.push(palette[base]); // B
            out.push(palette[base + 1]); // G
            out.push(palette[base + 2]); // R
        }
        Ok(out)
    }
}

/// Header fields of a `0x06`-prefixed direct-color graphic record.
struct DirectColorGraphic {
    width: u32,
    height: u32,
}

impl DirectColorGraphic {
    fn parse(key: Key, data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(PortalError::InvalidRecord(format!(
                "direct-color record {key}: header truncated ({} bytes)",
                data.len()
            )));
        }

        let width = read_u32(data, 4);
        let height = read_u32(data, 8);

        let pixel_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| PortalError::InvalidRecord(format!("direct-color record {key}: dimensions overflow")))?;

        if data.len() < 12 + pixel_len {
            return Err(PortalError::InvalidRecord(format!(
                "direct-color record {key}: pixel data truncated"
            )));
        }

        Ok(Self { width, height })
    }

    /// Decodes to top-down B,G,R rows. Source pixels are stored as
    /// `(R, G, B)` triples; the decoder reads source offsets `+2, +1, +0` as
    /// destination `B, G, R`, which is exactly the byte-order reversal
    /// BMP's `B,G,R` pixel layout needs.
    fn decode(&self, record: &[u8]) -> Result<Vec<u8>> {
        let pixels = &record[12..12 + (self.width * self.height * 3) as usize];
        let mut out = Vec::with_capacity(pixels.len());
        for src in pixels.chunks_exact(3) {
            out.push(src[2]);
            out.push(src[1]);
            out.push(src[0]);
        }
        Ok(out)
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn round_up_to_word(n: usize) -> usize {
    n.div_ceil(4) * 4
}
