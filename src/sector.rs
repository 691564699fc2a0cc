//! Random-access fixed-size block reader over the host archive file.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{PortalError, Result};
use crate::types::{ArchiveDialect, ROOT_POINTER_WORD_OFFSET};

/// Delivers exactly `sector_size` bytes starting at a given byte offset into
/// the host file. The sector size is fixed for the lifetime of a reader,
/// chosen by the caller per [`ArchiveDialect`].
///
/// No caching is performed: higher layers are expected to read each sector
/// at most once per operation.
pub struct SectorReader {
    file: BufReader<File>,
    dialect: ArchiveDialect,
}

impl SectorReader {
    /// Opens `path` for sector-at-a-time reading under the given dialect.
    pub fn open(path: &Path, dialect: ArchiveDialect) -> Result<Self> {
        let file = File::open(path).map_err(|source| PortalError::ArchiveOpenFailed {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), sector_size = dialect.sector_size(), "opened archive");
        Ok(Self {
            file: BufReader::new(file),
            dialect,
        })
    }

    /// The sector size this reader was opened with.
    pub const fn sector_size(&self) -> usize {
        self.dialect.sector_size()
    }

    /// The dialect this reader was opened with.
    pub const fn dialect(&self) -> ArchiveDialect {
        self.dialect
    }

    /// Reads the byte offset of the root directory sector from the reserved
    /// header: the little-endian word at offset `0x148`.
    pub fn read_root_pointer(&mut self) -> Result<u32> {
        self.read_word(ROOT_POINTER_WORD_OFFSET)
    }

    /// Reads exactly `sector_size` bytes starting at `offset`.
    ///
    /// Fails with [`PortalError::NullPointer`] if `offset` is zero (callers
    /// must not forward null chain terminators), [`PortalError::SeekError`]
    /// if the offset cannot be positioned to, or [`PortalError::ShortRead`]
    /// if fewer than `sector_size` bytes are available.
    pub fn read_sector(&mut self, offset: u64) -> Result<Vec<u8>> {
        if offset == 0 {
            return Err(PortalError::NullPointer(
                "attempted to read sector at null offset".into(),
            ));
        }

        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| PortalError::SeekError { offset, source })?;

        let sector_size = self.sector_size();
        let mut buf = vec![0u8; sector_size];
        let read = read_as_much_as_possible(&mut self.file, &mut buf)?;
        if read != sector_size {
            return Err(PortalError::ShortRead {
                offset,
                expected: sector_size,
                actual: read,
            });
        }

        trace!(offset = %format!("{offset:#x}"), sector_size, "read sector");
        Ok(buf)
    }

    /// Reads a single little-endian 32-bit word at an arbitrary byte offset.
    /// A convenience for isolated fields such as the root directory pointer.
    pub fn read_word(&mut self, offset: u64) -> Result<u32> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|source| PortalError::SeekError { offset, source })?;

        let mut buf = [0u8; 4];
        let read = read_as_much_as_possible(&mut self.file, &mut buf)?;
        if read != 4 {
            return Err(PortalError::ShortRead {
                offset,
                expected: 4,
                actual: read,
            });
        }
        Ok(u32::from_le_bytes(buf))
    }
}

/// Reads until `buf` is full or the underlying reader is exhausted,
/// returning the number of bytes actually read (mirrors a short `read`
/// rather than failing outright, so the caller can report `ShortRead` with
/// an accurate byte count).
fn read_as_much_as_possible<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}
