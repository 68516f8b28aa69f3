//! Field descriptors: where element `i` lives in a region and how to decode it.
//!
//! - `RowField` -- a field at a fixed offset inside fixed-size records
//!   (big-endian unless another byte order is named)
//! - `ColumnField` -- a contiguous array of elements (native byte order
//!   unless another byte order is named)
//! - `SubField` -- a bit range of either of the above

use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder, NativeEndian};

use crate::error::{Result, SearchError};
use crate::layout::ColumnWidth;
use crate::search::element::Element;

/// Addressable, decodable sequence of sorted values inside a byte region.
pub trait Field {
    type Value: Element;

    /// Decode element `index`. Fails with `OutOfBounds` if it lies outside `region`.
    fn value_at(&self, region: &[u8], index: u64) -> Result<Self::Value>;
}

impl<F: Field + ?Sized> Field for &F {
    type Value = F::Value;

    #[inline]
    fn value_at(&self, region: &[u8], index: u64) -> Result<Self::Value> {
        (**self).value_at(region, index)
    }
}

/// First byte position of record `item`: `stride * item + field_offset`.
///
/// Returns None on overflow.
#[inline]
pub fn address(stride: u64, field_offset: u64, item: u64) -> Option<u64> {
    stride.checked_mul(item)?.checked_add(field_offset)
}

#[inline]
fn read_element<T: Element, B: ByteOrder>(region: &[u8], offset: Option<u64>) -> Result<T> {
    let width = T::WIDTH.bytes() as usize;
    offset
        .and_then(|offset| usize::try_from(offset).ok())
        .and_then(|start| region.get(start..start.checked_add(width)?))
        .map(T::read::<B>)
        .ok_or(SearchError::OutOfBounds {
            offset: offset.unwrap_or(u64::MAX),
            width,
            len: region.len(),
        })
}

// ── Row Field ──────────────────────────────────────────────────────

/// Field at `field_offset` within records of `stride` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowField<T, B = BigEndian> {
    stride: u64,
    field_offset: u64,
    _marker: PhantomData<(T, B)>,
}

impl<T: Element, B: ByteOrder> RowField<T, B> {
    /// Fails with `InvalidArgument` if the field does not fit inside a record.
    pub fn new(stride: u64, field_offset: u64) -> Result<Self> {
        let fits = field_offset
            .checked_add(T::WIDTH.bytes())
            .is_some_and(|end| end <= stride);
        if !fits {
            return Err(SearchError::InvalidArgument(format!(
                "{}-byte field at offset {} does not fit in {}-byte records",
                T::WIDTH.bytes(),
                field_offset,
                stride
            )));
        }
        Ok(Self {
            stride,
            field_offset,
            _marker: PhantomData,
        })
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn field_offset(&self) -> u64 {
        self.field_offset
    }
}

impl<T: Element, B: ByteOrder> Field for RowField<T, B> {
    type Value = T;

    #[inline]
    fn value_at(&self, region: &[u8], index: u64) -> Result<T> {
        read_element::<T, B>(region, address(self.stride, self.field_offset, index))
    }
}

// ── Column Field ───────────────────────────────────────────────────

/// Contiguous array of `T` starting at `base_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnField<T, B = NativeEndian> {
    base_offset: u64,
    _marker: PhantomData<(T, B)>,
}

impl<T: Element, B: ByteOrder> ColumnField<T, B> {
    pub fn new(base_offset: u64) -> Self {
        Self {
            base_offset,
            _marker: PhantomData,
        }
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }
}

impl<T: Element, B: ByteOrder> Field for ColumnField<T, B> {
    type Value = T;

    #[inline]
    fn value_at(&self, region: &[u8], index: u64) -> Result<T> {
        read_element::<T, B>(region, address(T::WIDTH.bytes(), self.base_offset, index))
    }
}

// ── Bit Range ──────────────────────────────────────────────────────

/// Inclusive bit range `[start, end]`, LSB = bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    start: u8,
    end: u8,
}

impl BitRange {
    /// Fails with `InvalidArgument` unless `start <= end < width.bits()`.
    pub fn new(start: u8, end: u8, width: ColumnWidth) -> Result<Self> {
        if start > end || end as u32 >= width.bits() {
            return Err(SearchError::InvalidArgument(format!(
                "bit range [{}, {}] invalid for a {}-bit element",
                start,
                end,
                width.bits()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Number of bits in the range.
    pub fn bit_count(&self) -> u32 {
        (self.end - self.start) as u32 + 1
    }

    pub fn mask(&self) -> u64 {
        if self.bit_count() == 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_count()) - 1
        }
    }

    /// Right-aligned bits `[start, end]` of `value`.
    #[inline]
    pub fn extract(&self, value: u64) -> u64 {
        (value >> self.start) & self.mask()
    }
}

// ── Sub Field ──────────────────────────────────────────────────────

/// Compares only bits `[bit_start, bit_end]` of another field's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubField<F> {
    inner: F,
    bits: BitRange,
}

impl<F: Field> SubField<F> {
    pub fn new(inner: F, bit_start: u8, bit_end: u8) -> Result<Self> {
        let bits = BitRange::new(bit_start, bit_end, F::Value::WIDTH)?;
        Ok(Self { inner, bits })
    }

    pub fn bits(&self) -> BitRange {
        self.bits
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: Field> Field for SubField<F> {
    type Value = F::Value;

    #[inline]
    fn value_at(&self, region: &[u8], index: u64) -> Result<F::Value> {
        let value = self.inner.value_at(region, index)?;
        Ok(F::Value::from_u64_truncated(self.bits.extract(value.to_u64())))
    }
}
