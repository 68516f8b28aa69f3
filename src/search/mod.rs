//! Fixed-width binary search over sorted regions.
//!
//! Provides:
//! - `element` -- the u8/u16/u32/u64 element types
//! - `field` -- row-major, column-major and bit sub-field addressing
//! - `engine` -- constrained first/last occurrence search
//! - `batch` -- many lookups against one region, in parallel

pub mod batch;
pub mod element;
pub mod engine;
pub mod field;

pub use batch::{find_first_all, find_last_all};
pub use element::Element;
pub use engine::{find_first, find_last, Lookup, Run, Window};
pub use field::{address, BitRange, ColumnField, Field, RowField, SubField};
