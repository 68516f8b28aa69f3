//! Error types for the search engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Read of {width} bytes at offset {offset} exceeds region of {len} bytes")]
    OutOfBounds { offset: u64, width: usize, len: usize },
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::InvalidFormat(format!("config: {}", e))
    }
}

impl SearchError {
    /// Get a stable error code for callers that cross a language boundary
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::Io(_) => "IO_ERROR",
            SearchError::InvalidFormat(_) => "FORMAT_ERROR",
            SearchError::InvalidArgument(_) => "INVALID_ARGUMENT",
            SearchError::OutOfBounds { .. } => "OUT_OF_BOUNDS",
        }
    }
}
