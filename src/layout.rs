//! Column layout inside a data region.
//!
//! Columns are stored back to back in declaration order. Each column holds
//! `element_count * width` bytes and starts on an 8-byte boundary relative
//! to the region start:
//!
//! ```text
//! data_offset
//! |-- col 0: n * w0 --|pad|-- col 1: n * w1 --|pad|-- ... --|pad|
//!                         ^ align8                ^ align8
//! ```
//!
//! The element count is not stored anywhere, so it is solved for from the
//! region length.

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::format::arrow::BatchBuffers;

/// Column buffer alignment within the data region.
pub const COLUMN_ALIGNMENT: u64 = 8;

/// Round `offset` up to the next multiple of [`COLUMN_ALIGNMENT`].
///
/// Returns None if the rounded offset does not fit in a u64.
#[inline]
pub fn align8(offset: u64) -> Option<u64> {
    offset
        .checked_add(COLUMN_ALIGNMENT - 1)
        .map(|v| v & !(COLUMN_ALIGNMENT - 1))
}

// ── Column Width ───────────────────────────────────────────────────

/// Byte width of a fixed-width unsigned column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnWidth {
    U8 = 1,
    U16 = 2,
    U32 = 4,
    U64 = 8,
}

impl ColumnWidth {
    pub fn from_bytes(bytes: u8) -> Result<Self> {
        match bytes {
            1 => Ok(Self::U8),
            2 => Ok(Self::U16),
            4 => Ok(Self::U32),
            8 => Ok(Self::U64),
            _ => Err(SearchError::InvalidArgument(format!(
                "column width must be 1, 2, 4 or 8 bytes, got {}",
                bytes
            ))),
        }
    }

    #[inline]
    pub fn bytes(self) -> u64 {
        self as u64
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self as u32 * 8
    }

    /// Largest value representable in this width.
    pub fn max_value(self) -> u64 {
        match self {
            Self::U64 => u64::MAX,
            _ => (1u64 << self.bits()) - 1,
        }
    }
}

// ── Column Layout ──────────────────────────────────────────────────

/// Element count and absolute base offset of every column in a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    element_count: u64,
    widths: Vec<ColumnWidth>,
    offsets: Vec<u64>,
}

impl ColumnLayout {
    /// Resolve the layout of columns with the given byte widths.
    pub fn resolve(data_offset: u64, data_length: u64, widths: &[u8]) -> Result<Self> {
        let widths = widths
            .iter()
            .map(|&w| ColumnWidth::from_bytes(w))
            .collect::<Result<Vec<_>>>()?;
        Self::resolve_widths(data_offset, data_length, &widths)
    }

    /// Resolve the layout of typed column widths.
    ///
    /// The element count is the largest `n` whose unpadded end of the last
    /// column fits in `data_length`; bytes left over must be trailing
    /// alignment padding.
    pub fn resolve_widths(data_offset: u64, data_length: u64, widths: &[ColumnWidth]) -> Result<Self> {
        if widths.is_empty() {
            return Err(SearchError::InvalidFormat(
                "no column widths to lay out".into(),
            ));
        }
        let row_bytes: u64 = widths.iter().map(|w| w.bytes()).sum();

        // end(n) >= n * row_bytes, so the count is bounded by length / row_bytes.
        let (mut lo, mut hi) = (0u64, data_length / row_bytes);
        while lo < hi {
            let mid = lo + (hi - lo) / 2 + 1;
            match unpadded_end(widths, mid) {
                Some(end) if end <= data_length => lo = mid,
                _ => hi = mid - 1,
            }
        }
        let element_count = lo;

        let overflow = || SearchError::InvalidFormat(format!("{} rows overflow the column layout", element_count));
        let end = unpadded_end(widths, element_count).ok_or_else(overflow)?;
        // An end too close to u64::MAX to round up leaves under 8 bytes, all padding.
        if align8(end).is_some_and(|padded| padded < data_length) {
            return Err(SearchError::InvalidFormat(format!(
                "no element count fits {} bytes of columns {:?}: {} rows end at {}",
                data_length,
                widths.iter().map(|w| w.bytes()).collect::<Vec<_>>(),
                element_count,
                end
            )));
        }

        let mut offsets = Vec::with_capacity(widths.len());
        let mut rel = 0u64;
        for (i, w) in widths.iter().enumerate() {
            let abs = data_offset.checked_add(rel).ok_or_else(|| {
                SearchError::InvalidFormat(format!("column offset overflows past data offset {}", data_offset))
            })?;
            offsets.push(abs);
            if i + 1 < widths.len() {
                rel = element_count
                    .checked_mul(w.bytes())
                    .and_then(|len| rel.checked_add(len))
                    .and_then(align8)
                    .ok_or_else(overflow)?;
            }
        }

        debug!(data_offset, data_length, element_count, ?offsets, "resolved column layout");
        Ok(Self {
            element_count,
            widths: widths.to_vec(),
            offsets,
        })
    }

    /// Layout of fixed-width columns from the buffers of an Arrow record batch.
    ///
    /// Each column owns two consecutive buffers, validity then values; the
    /// values buffer must hold `row_count` elements of the column width.
    pub fn from_batch_buffers(batch: &BatchBuffers, widths: &[u8]) -> Result<Self> {
        if widths.is_empty() {
            return Err(SearchError::InvalidFormat(
                "no column widths to lay out".into(),
            ));
        }
        let widths = widths
            .iter()
            .map(|&w| ColumnWidth::from_bytes(w))
            .collect::<Result<Vec<_>>>()?;
        if batch.buffers.len() != widths.len() * 2 {
            return Err(SearchError::InvalidFormat(format!(
                "record batch has {} buffers, {} fixed-width columns need {}",
                batch.buffers.len(),
                widths.len(),
                widths.len() * 2
            )));
        }

        let mut offsets = Vec::with_capacity(widths.len());
        for (column, (w, pair)) in widths.iter().zip(batch.buffers.chunks_exact(2)).enumerate() {
            let values = pair[1];
            let fits = batch
                .row_count
                .checked_mul(w.bytes())
                .is_some_and(|needed| needed <= values.length);
            if !fits {
                return Err(SearchError::InvalidFormat(format!(
                    "column {} values buffer of {} bytes is short for {} rows of {} bytes",
                    column,
                    values.length,
                    batch.row_count,
                    w.bytes()
                )));
            }
            offsets.push(values.offset);
        }

        debug!(element_count = batch.row_count, ?offsets, "resolved record batch layout");
        Ok(Self {
            element_count: batch.row_count,
            widths,
            offsets,
        })
    }

    /// Number of rows in every column.
    pub fn element_count(&self) -> u64 {
        self.element_count
    }

    pub fn column_count(&self) -> usize {
        self.widths.len()
    }

    /// Absolute base offsets, one per column.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn widths(&self) -> &[ColumnWidth] {
        &self.widths
    }

    pub fn column_offset(&self, column: usize) -> Option<u64> {
        self.offsets.get(column).copied()
    }

    pub fn column_width(&self, column: usize) -> Option<ColumnWidth> {
        self.widths.get(column).copied()
    }
}

/// Relative end of the last column's elements for `n` rows.
fn unpadded_end(widths: &[ColumnWidth], n: u64) -> Option<u64> {
    let mut start = 0u64;
    let mut end = 0u64;
    for (i, w) in widths.iter().enumerate() {
        end = start.checked_add(n.checked_mul(w.bytes())?)?;
        if i + 1 < widths.len() {
            start = align8(end)?;
        }
    }
    Some(end)
}
