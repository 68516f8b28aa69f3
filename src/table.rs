//! Column files: a mapped file with its columns laid out.
//!
//! `ColumnFile` bundles the mapping, container detection and layout
//! resolution behind one handle. Columns are reached through `AnyColumn`,
//! which carries the width as a runtime tag and dispatches to the typed
//! search code with `u64` keys.

use std::path::Path;

use tracing::debug;

use crate::config::{FormatHint, TableConfig};
use crate::cursor::{self, Step};
use crate::error::{Result, SearchError};
use crate::format::{self, arrow, ContainerFormat, DataRegion};
use crate::layout::{ColumnLayout, ColumnWidth};
use crate::mmap::MappedFile;
use crate::search::element::Element;
use crate::search::engine::{self, Lookup, Window};
use crate::search::field::{ColumnField, Field, SubField};

/// Run `$body` with `$t` bound to the element type of `$width`.
macro_rules! dispatch {
    ($width:expr, |$t:ident| $body:expr) => {
        match $width {
            ColumnWidth::U8 => {
                type $t = u8;
                $body
            }
            ColumnWidth::U16 => {
                type $t = u16;
                $body
            }
            ColumnWidth::U32 => {
                type $t = u32;
                $body
            }
            ColumnWidth::U64 => {
                type $t = u64;
                $body
            }
        }
    };
}

// ── Any Column ─────────────────────────────────────────────────────

/// A column-major array whose element width is known only at runtime.
///
/// Keys are passed as `u64` and must fit in the column width; a key that
/// does not fails with `InvalidArgument`. Elements decode in native byte
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyColumn {
    width: ColumnWidth,
    base_offset: u64,
}

impl AnyColumn {
    pub fn new(width: ColumnWidth, base_offset: u64) -> Self {
        Self { width, base_offset }
    }

    pub fn width(&self) -> ColumnWidth {
        self.width
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// Element `index`, widened to `u64`.
    pub fn value_at(&self, region: &[u8], index: u64) -> Result<u64> {
        dispatch!(self.width, |T| {
            let field = ColumnField::<T>::new(self.base_offset);
            Ok(field.value_at(region, index)?.to_u64())
        })
    }

    pub fn find_first(&self, region: &[u8], window: Window, key: u64) -> Result<Lookup> {
        dispatch!(self.width, |T| {
            let field = ColumnField::<T>::new(self.base_offset);
            engine::find_first(region, &field, window, T::try_from_u64(key)?)
        })
    }

    pub fn find_last(&self, region: &[u8], window: Window, key: u64) -> Result<Lookup> {
        dispatch!(self.width, |T| {
            let field = ColumnField::<T>::new(self.base_offset);
            engine::find_last(region, &field, window, T::try_from_u64(key)?)
        })
    }

    /// `find_first` comparing only bits `[bit_start, bit_end]` of each element.
    pub fn find_first_sub(&self, region: &[u8], bit_start: u8, bit_end: u8, window: Window, key: u64) -> Result<Lookup> {
        dispatch!(self.width, |T| {
            let field = SubField::new(ColumnField::<T>::new(self.base_offset), bit_start, bit_end)?;
            engine::find_first(region, &field, window, T::try_from_u64(key)?)
        })
    }

    pub fn find_last_sub(&self, region: &[u8], bit_start: u8, bit_end: u8, window: Window, key: u64) -> Result<Lookup> {
        dispatch!(self.width, |T| {
            let field = SubField::new(ColumnField::<T>::new(self.base_offset), bit_start, bit_end)?;
            engine::find_last(region, &field, window, T::try_from_u64(key)?)
        })
    }

    pub fn has_next(&self, region: &[u8], pos: u64, last: u64, key: u64) -> Result<Step> {
        dispatch!(self.width, |T| {
            let field = ColumnField::<T>::new(self.base_offset);
            cursor::has_next(region, &field, pos, last, T::try_from_u64(key)?)
        })
    }

    pub fn has_prev(&self, region: &[u8], first: u64, pos: u64, key: u64) -> Result<Step> {
        dispatch!(self.width, |T| {
            let field = ColumnField::<T>::new(self.base_offset);
            cursor::has_prev(region, &field, first, pos, T::try_from_u64(key)?)
        })
    }

    pub fn has_next_sub(&self, region: &[u8], bit_start: u8, bit_end: u8, pos: u64, last: u64, key: u64) -> Result<Step> {
        dispatch!(self.width, |T| {
            let field = SubField::new(ColumnField::<T>::new(self.base_offset), bit_start, bit_end)?;
            cursor::has_next(region, &field, pos, last, T::try_from_u64(key)?)
        })
    }

    pub fn has_prev_sub(&self, region: &[u8], bit_start: u8, bit_end: u8, first: u64, pos: u64, key: u64) -> Result<Step> {
        dispatch!(self.width, |T| {
            let field = SubField::new(ColumnField::<T>::new(self.base_offset), bit_start, bit_end)?;
            cursor::has_prev(region, &field, first, pos, T::try_from_u64(key)?)
        })
    }
}

// ── Column File ────────────────────────────────────────────────────

/// A mapped Arrow, Feather or raw column file.
#[derive(Debug)]
pub struct ColumnFile {
    map: MappedFile,
    format: Option<ContainerFormat>,
    region: DataRegion,
    layout: ColumnLayout,
}

impl ColumnFile {
    /// Open a file holding columns of the given byte widths.
    ///
    /// Arrow and Feather containers are detected by magic; anything else is
    /// treated as raw columns starting at offset 0.
    pub fn open(path: &Path, widths: &[u8]) -> Result<Self> {
        Self::open_with(path, &TableConfig::new(widths.to_vec()))
    }

    pub fn open_with(path: &Path, config: &TableConfig) -> Result<Self> {
        let map = MappedFile::open_with(path, &config.map)?;
        Self::from_mapped(map, &config.columns, config.format)
    }

    /// Lay out the columns of an already mapped file.
    pub fn from_mapped(map: MappedFile, widths: &[u8], hint: FormatHint) -> Result<Self> {
        let (format, region) = format::resolve(map.as_bytes(), hint)?;
        // Arrow writers may pad or add validity buffers, so take the column
        // offsets from the record batch rather than solving for them.
        let layout = match format {
            Some(ContainerFormat::Arrow) => {
                ColumnLayout::from_batch_buffers(&arrow::batch_buffers(map.as_bytes())?, widths)?
            }
            _ => ColumnLayout::resolve(region.offset, region.length, widths)?,
        };
        debug!(
            path = %map.path().display(),
            ?format,
            data_offset = region.offset,
            data_length = region.length,
            rows = layout.element_count(),
            "opened column file"
        );
        Ok(Self {
            map,
            format,
            region,
            layout,
        })
    }

    pub fn row_count(&self) -> u64 {
        self.layout.element_count()
    }

    pub fn column_count(&self) -> usize {
        self.layout.column_count()
    }

    /// Detected container, None for raw files.
    pub fn format(&self) -> Option<ContainerFormat> {
        self.format
    }

    pub fn data_region(&self) -> DataRegion {
        self.region
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// The whole mapped file. Column offsets are absolute into this slice.
    pub fn bytes(&self) -> &[u8] {
        self.map.as_bytes()
    }

    pub fn mapped(&self) -> &MappedFile {
        &self.map
    }

    pub fn column(&self, index: usize) -> Result<AnyColumn> {
        match (self.layout.column_width(index), self.layout.column_offset(index)) {
            (Some(width), Some(offset)) => Ok(AnyColumn::new(width, offset)),
            _ => Err(SearchError::InvalidArgument(format!(
                "column {} out of range, file has {} columns",
                index,
                self.column_count()
            ))),
        }
    }

    /// Typed view of column `index`. Fails if `T` does not match its width.
    pub fn typed_column<T: Element>(&self, index: usize) -> Result<ColumnField<T>> {
        let column = self.column(index)?;
        if column.width() != T::WIDTH {
            return Err(SearchError::InvalidArgument(format!(
                "column {} is {} bits wide, not {}",
                index,
                column.width().bits(),
                T::WIDTH.bits()
            )));
        }
        Ok(ColumnField::new(column.base_offset()))
    }

    /// Window over every row. Fails for a file with no rows.
    pub fn window(&self) -> Result<Window> {
        Window::all(self.row_count())
    }

    pub fn find_first(&self, column: usize, window: Window, key: u64) -> Result<Lookup> {
        self.column(column)?.find_first(self.bytes(), window, key)
    }

    pub fn find_last(&self, column: usize, window: Window, key: u64) -> Result<Lookup> {
        self.column(column)?.find_last(self.bytes(), window, key)
    }

    pub fn has_next(&self, column: usize, pos: u64, last: u64, key: u64) -> Result<Step> {
        self.column(column)?.has_next(self.bytes(), pos, last, key)
    }

    pub fn has_prev(&self, column: usize, first: u64, pos: u64, key: u64) -> Result<Step> {
        self.column(column)?.has_prev(self.bytes(), first, pos, key)
    }

    /// Unmap the file, reporting descriptor close failures.
    pub fn close(self) -> Result<()> {
        self.map.close()
    }
}
