//! Binary search over memory-mapped, pre-sorted, fixed-width columns.
//!
//! Files are mapped read-only and searched in place. Row-major files hold
//! fixed-size records with the sorted field at a fixed offset; column-major
//! files hold one contiguous array per field, either raw or inside an Arrow
//! IPC or legacy Feather container. Searches find the first and last index
//! of a key inside an inclusive window and report `last + 1` when the key is
//! absent; cursors then walk the remaining matches one step at a time.

pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod layout;
pub mod mmap;
pub mod search;
pub mod table;

pub use config::{FormatHint, MapOptions, TableConfig};
pub use cursor::{has_next, has_prev, matches, MatchCursor, Matches, Step};
pub use error::{Result, SearchError};
pub use format::{ContainerFormat, DataRegion};
pub use layout::{ColumnLayout, ColumnWidth};
pub use mmap::MappedFile;
pub use search::{
    address, find_first, find_first_all, find_last, find_last_all, BitRange, ColumnField, Element, Field, Lookup,
    RowField, Run, SubField, Window,
};
pub use table::{AnyColumn, ColumnFile};
