//! Shared fixtures for integration tests: Arrow files from the arrow-rs
//! writer, plus hand-built Feather and raw column files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Once};

use arrow_array::{ArrayRef, RecordBatch, UInt32Array, UInt64Array};
use arrow_ipc::writer::FileWriter;
use arrow_schema::{DataType, Field, Schema};
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness writer.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

pub fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn pad8(buf: &mut Vec<u8>) {
    while buf.len() % 8 != 0 {
        buf.push(0);
    }
}

/// Column buffers for 251 rows of (u8, u16, u32, u64) in native byte order.
///
/// Row `i` holds `i` in the u8 column, `i << 8` in the u16 column,
/// `i << 16` in the u32 column and `i << 32` in the u64 column, so every
/// column is sorted and the values are unique.
pub fn four_columns() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..251u64 {
        data.push(i as u8);
    }
    pad8(&mut data);
    for i in 0..251u64 {
        data.extend_from_slice(&((i << 8) as u16).to_ne_bytes());
    }
    pad8(&mut data);
    for i in 0..251u64 {
        data.extend_from_slice(&((i << 16) as u32).to_ne_bytes());
    }
    pad8(&mut data);
    for i in 0..251u64 {
        data.extend_from_slice(&(i << 32).to_ne_bytes());
    }
    pad8(&mut data);
    data
}

/// Column buffers for `keys` (u32) followed by `values` (u64).
pub fn key_value_columns(keys: &[u32], values: &[u64]) -> Vec<u8> {
    let mut data = Vec::new();
    for k in keys {
        data.extend_from_slice(&k.to_ne_bytes());
    }
    pad8(&mut data);
    for v in values {
        data.extend_from_slice(&v.to_ne_bytes());
    }
    pad8(&mut data);
    data
}

/// Legacy Feather file wrapping `data`, with opaque metadata.
pub fn feather_file(data: &[u8]) -> Vec<u8> {
    let metadata = [0x5Au8; 36];
    let mut f = Vec::new();
    f.extend_from_slice(b"FEA1");
    f.extend_from_slice(&[0; 4]);
    f.extend_from_slice(data);
    f.extend_from_slice(&metadata);
    f.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    f.extend_from_slice(b"FEA1");
    f
}

/// Arrow IPC file with one record batch of a u32 "key" and a u64 "value"
/// column, written by the arrow-rs file writer.
pub fn arrow_file(keys: &[u32], values: &[u64]) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("key", DataType::UInt32, false),
        Field::new("value", DataType::UInt64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(UInt32Array::from(keys.to_vec())) as ArrayRef,
            Arc::new(UInt64Array::from(values.to_vec())) as ArrayRef,
        ],
    )
    .unwrap();

    let mut writer = FileWriter::try_new(Vec::new(), &schema).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();
    writer.into_inner().unwrap()
}

/// Row-major records: `stride` bytes each, u32 key at `offset`, big-endian.
pub fn be_records(keys: &[u32], stride: usize, offset: usize) -> Vec<u8> {
    let mut data = vec![0xEEu8; keys.len() * stride];
    for (i, k) in keys.iter().enumerate() {
        let at = i * stride + offset;
        data[at..at + 4].copy_from_slice(&k.to_be_bytes());
    }
    data
}
