//! Minimal uncompressed 24-bit BMP writer.
//!
//! The BMP container itself is well-standardized and trivial enough that
//! a hand-rolled encoder is more direct than pulling in an image crate for
//! the sole purpose of writing one format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Result;

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;

/// Writes `width` x `height` pixels, supplied top-down as `width * height`
/// `(B, G, R)` triples with no row padding, as an uncompressed 24-bit BMP.
///
/// Row padding (`width mod 4` zero bytes per row) and the
/// bottom-up row order BMP requires are both handled here so callers only
/// ever produce top-down pixel data.
pub fn write_bmp(path: &Path, width: u32, height: u32, pixels_bgr_top_down: &[u8]) -> Result<()> {
    debug_assert_eq!(pixels_bgr_top_down.len(), (width * height * 3) as usize);

    let pad_bytes = (width & 3) as usize;
    let row_stride = width as usize * 3 + pad_bytes;
    let data_size = row_stride * height as usize;
    let file_size = FILE_HEADER_SIZE + INFO_HEADER_SIZE + data_size as u32;

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    // BITMAPFILEHEADER
    out.write_u8(b'B')?;
    out.write_u8(b'M')?;
    out.write_u32::<LittleEndian>(file_size)?;
    out.write_u16::<LittleEndian>(0)?; // reserved1
    out.write_u16::<LittleEndian>(0)?; // reserved2
    out.write_u32::<LittleEndian>(FILE_HEADER_SIZE + INFO_HEADER_SIZE)?;

    // BITMAPINFOHEADER
    out.write_u32::<LittleEndian>(INFO_HEADER_SIZE)?;
    out.write_i32::<LittleEndian>(width as i32)?;
    out.write_i32::<LittleEndian>(height as i32)?;
    out.write_u16::<LittleEndian>(1)?; // planes
    out.write_u16::<LittleEndian>(24)?; // bitcount
    out.write_u32::<LittleEndian>(0)?; // compression: BI_RGB
    out.write_u32::<LittleEndian>(data_size as u32)?;
    out.write_i32::<LittleEndian>(0)?; // x pixels per meter
    out.write_i32::<LittleEndian>(0)?; // y pixels per meter
    out.write_u32::<LittleEndian>(0)?; // colors used
    out.write_u32::<LittleEndian>(0)?; // important colors

    let pad = [0u8; 3];
    for y in (0..height as usize).rev() {
        let row = &pixels_bgr_top_down[y * width as usize * 3..(y + 1) * width as usize * 3];
        out.write_all(row)?;
        out.write_all(&pad[..pad_bytes])?;
    }

    out.flush()?;
    Ok(())
}
