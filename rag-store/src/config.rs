//! Store locations and ingestion knobs.

use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::RagError;

pub const DEFAULT_DATASET_PATH: &str = "data/data_uic.csv";
pub const DEFAULT_INDEX_PATH: &str = "vecstore/index.bin";
pub const DEFAULT_META_PATH: &str = "vecstore/meta.json";
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Where the persisted store lives and how it is built.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Source dataset (`.csv` or `.jsonl`).
    pub dataset_path: PathBuf,
    /// Binary flat index file.
    pub index_path: PathBuf,
    /// JSON metadata file (records + texts).
    pub meta_path: PathBuf,
    /// Texts per embedding request during ingestion.
    pub embed_batch_size: usize,
    /// Expected embedding dimension; discovered from the first vector when unset.
    pub embedding_dim: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dataset_path: DEFAULT_DATASET_PATH.into(),
            index_path: DEFAULT_INDEX_PATH.into(),
            meta_path: DEFAULT_META_PATH.into(),
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            embedding_dim: None,
        }
    }
}

impl StoreConfig {
    /// Reads `DATASET_PATH`, `INDEX_PATH`, `META_PATH`, `EMBED_BATCH_SIZE`
    /// and `EMBEDDING_DIM`, falling back to the defaults.
    ///
    /// # Errors
    /// `RagError::Config` for unparsable numbers or a zero batch size.
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();
        let cfg = Self {
            dataset_path: env_path("DATASET_PATH").unwrap_or(d.dataset_path),
            index_path: env_path("INDEX_PATH").unwrap_or(d.index_path),
            meta_path: env_path("META_PATH").unwrap_or(d.meta_path),
            embed_batch_size: env_parse("EMBED_BATCH_SIZE")?.unwrap_or(d.embed_batch_size),
            embedding_dim: env_parse("EMBEDDING_DIM")?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.embed_batch_size == 0 {
            return Err(RagError::Config("embed_batch_size must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if self.index_path == self.meta_path {
            return Err(RagError::Config(
                "index_path and meta_path must differ".into(),
            ));
        }
        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Parses an optional env var; unset or blank is `None`.
pub fn env_parse<T>(name: &str) -> Result<Option<T>, RagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(s) if !s.trim().is_empty() => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RagError::Config(format!("{name}={s:?}: {e}"))),
        _ => Ok(None),
    }
}
