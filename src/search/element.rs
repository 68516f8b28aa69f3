//! Fixed-width unsigned element types.

use std::fmt::Debug;

use byteorder::ByteOrder;

use crate::error::{Result, SearchError};
use crate::layout::ColumnWidth;

/// An unsigned integer that can be stored in a searchable column.
///
/// Implemented for `u8`, `u16`, `u32` and `u64`.
pub trait Element: Copy + Ord + Debug + Send + Sync + 'static {
    const WIDTH: ColumnWidth;

    /// Decode from exactly `WIDTH` bytes in byte order `B`.
    fn read<B: ByteOrder>(buf: &[u8]) -> Self;

    fn to_u64(self) -> u64;

    /// Keep the low `WIDTH` bytes of `v`.
    fn from_u64_truncated(v: u64) -> Self;

    /// Convert a wide key, failing if it does not fit in `WIDTH` bytes.
    fn try_from_u64(v: u64) -> Result<Self> {
        if v > Self::WIDTH.max_value() {
            return Err(SearchError::InvalidArgument(format!(
                "key {:#x} does not fit in a {}-bit column",
                v,
                Self::WIDTH.bits()
            )));
        }
        Ok(Self::from_u64_truncated(v))
    }
}

impl Element for u8 {
    const WIDTH: ColumnWidth = ColumnWidth::U8;

    #[inline]
    fn read<B: ByteOrder>(buf: &[u8]) -> Self {
        buf[0]
    }

    #[inline]
    fn to_u64(self) -> u64 {
        self as u64
    }

    #[inline]
    fn from_u64_truncated(v: u64) -> Self {
        v as u8
    }
}

macro_rules! impl_element {
    ($t:ty, $width:expr, $read:ident) => {
        impl Element for $t {
            const WIDTH: ColumnWidth = $width;

            #[inline]
            fn read<B: ByteOrder>(buf: &[u8]) -> Self {
                B::$read(buf)
            }

            #[inline]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline]
            fn from_u64_truncated(v: u64) -> Self {
                v as $t
            }
        }
    };
}

impl_element!(u16, ColumnWidth::U16, read_u16);
impl_element!(u32, ColumnWidth::U32, read_u32);
impl_element!(u64, ColumnWidth::U64, read_u64);
