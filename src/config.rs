//! Column file configuration.
//!
//! A `TableConfig` describes how to interpret a mapped file: the byte width
//! of each column in declaration order, which container format to expect,
//! and how the file should be mapped. It is usually stored as a JSON sidecar
//! next to the data file and read once before opening it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Format Hint ────────────────────────────────────────────────────

/// Which container format a file is expected to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    /// Detect Arrow/Feather by magic bytes, fall back to raw.
    #[default]
    Auto,
    /// Treat the whole file as raw column data, even if it looks like a container.
    Raw,
    /// Require an Arrow IPC file.
    Arrow,
    /// Require a legacy Feather (v1) file.
    Feather,
}

// ── Map Options ────────────────────────────────────────────────────

/// Options applied when memory-mapping a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Pre-fault all pages at map time.
    pub populate: bool,
    /// Advise the kernel that access is random, as binary search jumps around.
    pub random_access: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            populate: false,
            random_access: true,
        }
    }
}

// ── Table Config ───────────────────────────────────────────────────

/// Persistent description of a column file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Byte width of each column (1, 2, 4 or 8), in declaration order.
    pub columns: Vec<u8>,
    #[serde(default)]
    pub format: FormatHint,
    #[serde(default)]
    pub map: MapOptions,
}

impl TableConfig {
    /// Config with default format detection and mapping options.
    pub fn new(columns: Vec<u8>) -> Self {
        Self {
            columns,
            format: FormatHint::Auto,
            map: MapOptions::default(),
        }
    }

    /// Read config from a JSON file. Returns None if the file doesn't exist.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(Some(config))
    }

    /// Write config as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
