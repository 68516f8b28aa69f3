//! Arrow IPC file container.
//!
//! ```text
//! Offset        Size  Field
//! 0             6     magic: b"ARROW1"
//! 6             2     padding
//! 8             ...   schema message, record batch message(s)
//! F             L     footer flatbuffer
//! size-10       4     footer length L: i32 (little-endian)
//! size-6        6     magic: b"ARROW1"
//! ```
//!
//! The footer's `recordBatches` list gives, per batch, the message offset,
//! the metadata length (prefix + flatbuffer + padding) and the body length.
//! The column buffers of the batch are the message body, which starts at
//! `offset + metaDataLength` and spans `bodyLength` bytes. The footer and the
//! batch message are decoded with the generated readers from `arrow-ipc`.

use arrow_ipc::{root_as_footer, root_as_message};
use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::format::DataRegion;

/// Magic bytes at both ends of an Arrow IPC file.
pub const ARROW_MAGIC: &[u8; 6] = b"ARROW1";

/// Bytes before the first message (magic plus padding).
const HEADER_SIZE: usize = 8;

/// Trailing bytes after the footer: i32 length + magic.
const TRAILER_SIZE: usize = 4 + ARROW_MAGIC.len();

/// Marks the start of an encapsulated message (format 0.15 and later).
const CONTINUATION_MARKER: u32 = 0xFFFF_FFFF;

pub(crate) fn is_arrow(bytes: &[u8]) -> bool {
    bytes.len() >= ARROW_MAGIC.len() && &bytes[..ARROW_MAGIC.len()] == ARROW_MAGIC
}

fn malformed(what: impl std::fmt::Display) -> SearchError {
    SearchError::InvalidFormat(format!("Arrow {}", what))
}

// ── Blocks ─────────────────────────────────────────────────────────

/// One entry of the footer's record batch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub offset: i64,
    pub meta_data_length: i32,
    pub body_length: i64,
}

impl Block {
    /// Absolute byte range of the batch body, checked against `file_len`.
    pub fn body(&self, file_len: u64) -> Result<DataRegion> {
        if self.offset < 0 || self.meta_data_length < 0 || self.body_length < 0 {
            return Err(malformed(format_args!("block has negative fields: {:?}", self)));
        }
        let offset = (self.offset as u64)
            .checked_add(self.meta_data_length as u64)
            .ok_or_else(|| malformed(format_args!("block offset overflows: {:?}", self)))?;
        let region = DataRegion {
            offset,
            length: self.body_length as u64,
        };
        match region.end() {
            Some(end) if end <= file_len => Ok(region),
            Some(end) => Err(malformed(format_args!(
                "record batch body [{}, {}) exceeds file size {}",
                region.offset, end, file_len
            ))),
            None => Err(malformed(format_args!("record batch body overflows: {:?}", self))),
        }
    }
}

fn footer_bytes(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_SIZE + TRAILER_SIZE || !is_arrow(bytes) {
        return Err(SearchError::InvalidFormat(
            "File too small for Arrow IPC file".into(),
        ));
    }
    if &bytes[bytes.len() - ARROW_MAGIC.len()..] != ARROW_MAGIC {
        return Err(SearchError::InvalidFormat(
            "Arrow file is missing trailing ARROW1 magic".into(),
        ));
    }

    let footer_end = bytes.len() - TRAILER_SIZE;
    let footer_len = LittleEndian::read_i32(&bytes[footer_end..footer_end + 4]);
    if footer_len <= 0 || footer_len as usize > footer_end - HEADER_SIZE {
        return Err(malformed(format_args!("footer length {} out of range", footer_len)));
    }
    Ok(&bytes[footer_end - footer_len as usize..footer_end])
}

/// Read the record batch blocks listed in the footer.
pub fn record_batches(bytes: &[u8]) -> Result<Vec<Block>> {
    let footer = root_as_footer(footer_bytes(bytes)?).map_err(|e| malformed(format_args!("footer: {}", e)))?;
    let blocks = footer
        .recordBatches()
        .map(|blocks| {
            blocks
                .iter()
                .map(|b| Block {
                    offset: b.offset(),
                    meta_data_length: b.metaDataLength(),
                    body_length: b.bodyLength(),
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(blocks)
}

fn single_batch(bytes: &[u8]) -> Result<Block> {
    let blocks = record_batches(bytes)?;
    match blocks.as_slice() {
        [block] => Ok(*block),
        [] => Err(SearchError::InvalidFormat(
            "Arrow file has no record batch".into(),
        )),
        _ => Err(SearchError::InvalidFormat(format!(
            "Arrow file has {} record batches, expected 1",
            blocks.len()
        ))),
    }
}

/// Locate the column buffers of a single-batch Arrow IPC file.
pub fn data_region(bytes: &[u8]) -> Result<DataRegion> {
    let region = single_batch(bytes)?.body(bytes.len() as u64)?;
    debug!(offset = region.offset, length = region.length, "arrow record batch body");
    Ok(region)
}

// ── Batch Buffers ──────────────────────────────────────────────────

/// Row count and absolute buffer ranges of the single record batch.
///
/// Buffers are listed in schema order. A fixed-width column contributes a
/// validity buffer (possibly empty) followed by its values buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchBuffers {
    pub row_count: u64,
    pub buffers: Vec<DataRegion>,
}

/// Decode the record batch message of a single-batch Arrow IPC file.
///
/// Compressed batches are rejected since their buffers cannot be searched
/// in place.
pub fn batch_buffers(bytes: &[u8]) -> Result<BatchBuffers> {
    let block = single_batch(bytes)?;
    let body = block.body(bytes.len() as u64)?;
    // body() checked offset + meta_data_length against the file size.
    let meta = &bytes[block.offset as usize..body.offset as usize];

    let message = root_as_message(message_flatbuffer(meta)?).map_err(|e| malformed(format_args!("message: {}", e)))?;
    let batch = message
        .header_as_record_batch()
        .ok_or_else(|| malformed("block does not point at a record batch message"))?;
    if batch.compression().is_some() {
        return Err(malformed("record batch is compressed"));
    }
    if batch.length() < 0 {
        return Err(malformed(format_args!("record batch length {} is negative", batch.length())));
    }

    let mut buffers = Vec::new();
    for buffer in batch.buffers().into_iter().flatten() {
        if buffer.offset() < 0 || buffer.length() < 0 {
            return Err(malformed(format_args!("buffer has negative fields: {:?}", buffer)));
        }
        let region = (buffer.offset() as u64)
            .checked_add(buffer.length() as u64)
            .filter(|&end| end <= body.length)
            .map(|_| DataRegion {
                offset: body.offset + buffer.offset() as u64,
                length: buffer.length() as u64,
            })
            .ok_or_else(|| malformed(format_args!("buffer {:?} exceeds body of {} bytes", buffer, body.length)))?;
        buffers.push(region);
    }

    debug!(rows = batch.length(), buffers = buffers.len(), "arrow record batch buffers");
    Ok(BatchBuffers {
        row_count: batch.length() as u64,
        buffers,
    })
}

/// Strip the encapsulation prefix from a message's metadata bytes.
fn message_flatbuffer(meta: &[u8]) -> Result<&[u8]> {
    let word = |at: usize| {
        meta.get(at..at + 4)
            .map(LittleEndian::read_u32)
            .ok_or_else(|| malformed("message prefix truncated"))
    };
    let (start, len) = match word(0)? {
        CONTINUATION_MARKER => (8, word(4)? as i32),
        legacy => (4, legacy as i32),
    };
    if len < 0 {
        return Err(malformed(format_args!("message length {} is negative", len)));
    }
    meta.get(start..start + len as usize)
        .ok_or_else(|| malformed(format_args!("message of {} bytes exceeds metadata of {}", len, meta.len())))
}
