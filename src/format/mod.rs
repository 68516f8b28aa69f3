//! Columnar container recognition.
//!
//! Provides:
//! - `arrow` -- Arrow IPC file footer and record batch parsing
//! - `feather` -- legacy Feather (v1) header/trailer parsing
//!
//! A recognised container yields the `DataRegion` holding its column
//! buffers back to back. Files that are not containers have no region and
//! are treated as raw data by callers.

pub mod arrow;
pub mod feather;

use tracing::warn;

use crate::config::FormatHint;
use crate::error::{Result, SearchError};

/// Contiguous byte range holding the column buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRegion {
    /// Absolute offset of the first byte of the first column.
    pub offset: u64,
    /// Length in bytes of the region.
    pub length: u64,
}

impl DataRegion {
    /// The whole byte range of a raw file.
    pub fn whole(size: u64) -> Self {
        Self {
            offset: 0,
            length: size,
        }
    }

    /// One past the last byte, or None if the range overflows.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.length)
    }
}

/// Recognised container layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Arrow,
    Feather,
}

impl ContainerFormat {
    /// Identify a container by its leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if arrow::is_arrow(bytes) {
            Some(Self::Arrow)
        } else if feather::is_feather(bytes) {
            Some(Self::Feather)
        } else {
            None
        }
    }

    /// Locate the column buffers of a file in this format.
    pub fn data_region(self, bytes: &[u8]) -> Result<DataRegion> {
        match self {
            Self::Arrow => arrow::data_region(bytes),
            Self::Feather => feather::data_region(bytes),
        }
    }
}

/// Region of column buffers if `bytes` is a recognised container.
///
/// Returns `Ok(None)` for raw files; a recognised but malformed container
/// is an `InvalidFormat` error.
pub fn data_region(bytes: &[u8]) -> Result<Option<DataRegion>> {
    ContainerFormat::detect(bytes)
        .map(|format| format.data_region(bytes))
        .transpose()
}

/// Resolve the data region of a file according to a format hint.
///
/// Returns the detected container (None for raw) and the region to lay
/// columns out in.
pub fn resolve(bytes: &[u8], hint: FormatHint) -> Result<(Option<ContainerFormat>, DataRegion)> {
    let detected = ContainerFormat::detect(bytes);
    let expected = match hint {
        FormatHint::Auto => detected,
        FormatHint::Raw => {
            if let Some(format) = detected {
                warn!(?format, "container magic present, treating file as raw");
            }
            None
        }
        FormatHint::Arrow => Some(ContainerFormat::Arrow),
        FormatHint::Feather => Some(ContainerFormat::Feather),
    };

    match expected {
        None => Ok((None, DataRegion::whole(bytes.len() as u64))),
        Some(format) if detected == Some(format) => Ok((Some(format), format.data_region(bytes)?)),
        Some(format) => Err(SearchError::InvalidFormat(format!(
            "expected {:?} container, found {:?}",
            format, detected
        ))),
    }
}
