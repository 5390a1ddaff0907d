//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Dataset does not have the expected shape.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A required column is absent from the dataset header.
    #[error("missing column `{column}` in {path}")]
    MissingColumn { column: &'static str, path: PathBuf },

    /// The file extension is neither `.csv` nor `.jsonl`.
    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary index encoding/decoding errors.
    #[error("index codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// CSV reader errors.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset schema violations.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Embedding backend failed or returned no vector.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Mismatch in vector dimensionality across embeddings.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Query vector does not match the index dimension.
    #[error("dimension mismatch: index has {index}, query has {query}")]
    DimensionMismatch { index: usize, query: usize },

    /// Index rows, records and texts are not the same length.
    #[error("store misaligned: {vectors} vectors, {records} records, {texts} texts")]
    Misaligned {
        vectors: usize,
        records: usize,
        texts: usize,
    },

    /// Index and metadata files come from different ingestion runs.
    #[error("store fingerprint mismatch: index {index}, metadata {metadata}")]
    FingerprintMismatch { index: String, metadata: String },

    /// Nothing to index.
    #[error("dataset {0} has no rows")]
    EmptyDataset(PathBuf),

    /// Index file is not one of ours or was written by an incompatible version.
    #[error("invalid index file: {0}")]
    InvalidIndex(String),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),
}
