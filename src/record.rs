//! Reassembles a logical record from its linked sector chain.

use tracing::trace;

use crate::error::{PortalError, Result};
use crate::sector::SectorReader;
use crate::types::NEXT_POINTER_FLAG_MASK;

/// Walks a sector chain and assembles a record of declared length `length`,
/// starting at sector `offset`.
///
/// Each sector contributes its payload region (bytes `[4, sector_size)`) to
/// the output, in chain order; the chain's reserved high bit on every
/// `next_pointer` word is masked off before the offset is followed. The
/// last sector's contribution is truncated to exactly fill `length`.
pub struct RecordReader;

impl RecordReader {
    /// Reads a record of `length` bytes starting at sector `offset`.
    ///
    /// `offset == 0` with `length == 0` is the only null-start case
    /// permitted, returning an empty buffer without touching the reader;
    /// any other null start is rejected by [`SectorReader::read_sector`].
    pub fn read(sectors: &mut SectorReader, offset: u64, length: u32) -> Result<Vec<u8>> {
        let length = length as usize;
        let mut out = Vec::with_capacity(length);

        if length == 0 {
            return Ok(out);
        }

        let payload_size = sectors.sector_size() - 4;
        let mut next = offset;

        while out.len() < length {
            if next == 0 {
                return Err(PortalError::NullPointer(format!(
                    "sector chain terminated after {} of {} bytes",
                    out.len(),
                    length
                )));
            }

            let sector = sectors.read_sector(next)?;
            let next_pointer = u32::from_le_bytes(sector[0..4].try_into().unwrap());
            let payload = &sector[4..];

            let remaining = length - out.len();
            let take = remaining.min(payload_size);
            out.extend_from_slice(&payload[..take]);

            trace!(offset = %format!("{next:#x}"), took = take, remaining = length - out.len(), "consumed sector");

            // next_pointer's low 31 bits are the meaningful offset; the
            // high bit is a reserved flag and must never be forwarded.
            next = u64::from(next_pointer & !NEXT_POINTER_FLAG_MASK);
        }

        Ok(out)
    }
}
