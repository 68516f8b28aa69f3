//! Legacy Feather (v1) container.
//!
//! ```text
//! Offset        Size  Field
//! 0             4     magic: b"FEA1"
//! 4             4     padding
//! 8             D     column buffers
//! 8+D           M     metadata flatbuffer
//! size-8        4     metadata length M: u32 (little-endian)
//! size-4        4     magic: b"FEA1"
//! ```

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::format::DataRegion;

/// Magic bytes at both ends of a Feather v1 file.
pub const FEATHER_MAGIC: &[u8; 4] = b"FEA1";

/// Column data starts after the magic and its padding.
const DATA_OFFSET: u64 = 8;

/// Trailing bytes after the metadata: u32 length + magic.
const TRAILER_SIZE: u64 = 8;

pub(crate) fn is_feather(bytes: &[u8]) -> bool {
    bytes.len() >= FEATHER_MAGIC.len() && &bytes[..FEATHER_MAGIC.len()] == FEATHER_MAGIC
}

/// Locate the column buffers of a Feather v1 file.
pub fn data_region(bytes: &[u8]) -> Result<DataRegion> {
    let size = bytes.len() as u64;
    if size < DATA_OFFSET + TRAILER_SIZE || !is_feather(bytes) {
        return Err(SearchError::InvalidFormat(
            "File too small for Feather file".into(),
        ));
    }
    if &bytes[bytes.len() - FEATHER_MAGIC.len()..] != FEATHER_MAGIC {
        return Err(SearchError::InvalidFormat(
            "Feather file is missing trailing FEA1 magic".into(),
        ));
    }

    let trailer = bytes.len() - TRAILER_SIZE as usize;
    let metadata_len = LittleEndian::read_u32(&bytes[trailer..trailer + 4]) as u64;
    let length = (size - DATA_OFFSET - TRAILER_SIZE)
        .checked_sub(metadata_len)
        .ok_or_else(|| {
            SearchError::InvalidFormat(format!(
                "Feather metadata length {} exceeds file size {}",
                metadata_len, size
            ))
        })?;

    debug!(offset = DATA_OFFSET, length, metadata_len, "feather column data");
    Ok(DataRegion {
        offset: DATA_OFFSET,
        length,
    })
}
