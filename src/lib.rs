//! # featdb - Feature database reader
//!
//! Reads keypoints and descriptors written by a feature-extraction pipeline
//! into a single-file SQLite database and hands them out as matrices.
//!
//! featdb provides:
//! - A storage handle with a fixed set of prepared queries
//! - A blob codec turning `rows`/`cols`/`data` triples into `ndarray` matrices
//! - Keypoint and 8-bit descriptor conversions for downstream matchers

pub mod types;
pub mod blob;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use types::{CameraId, Image, ImageId, Keypoint};
pub use blob::BlobRow;
pub use storage::{FeatureStats, FeatureStore};

/// Result type alias for featdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for featdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database is closed")]
    Closed,

    #[error("Corrupt blob: {rows}x{cols} needs {expected} bytes, found {actual}")]
    CorruptBlob {
        rows: i64,
        cols: i64,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch: expected {expected} columns, found {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
