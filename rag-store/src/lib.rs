//! High-level RAG facade for the FAQ knowledge base: ingestion + retrieval
//! over an in-process flat inner-product index.
//!
//! This crate provides a clean API to:
//! - Read the FAQ dataset (CSV or JSONL) and embed it into a persisted store
//! - Load the store once and retrieve the top-K records for a textual query
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod dataset;
mod embed;
mod errors;
mod ingest;
mod io_util;
mod metadata;
mod progress;
mod record;
mod retrieve;
mod vector_index;

pub use config::{
    DEFAULT_DATASET_PATH, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_INDEX_PATH, DEFAULT_META_PATH,
    StoreConfig, env_parse,
};
pub use dataset::{COLUMNS, read_csv, read_jsonl, read_records};
pub use embed::gemini::GeminiEmbedder;
pub use embed::{DimGuard, EmbedFuture, EmbeddingsProvider};
pub use errors::{RagError, SchemaError};
pub use ingest::{IngestJob, IngestStats};
pub use metadata::MetadataStore;
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use record::{INDEXED_TEXT_SEPARATOR, Record, SearchResult};
pub use retrieve::{LoadedStore, Retriever};
pub use vector_index::{FlatIpIndex, Neighbor, SENTINEL_SCORE, normalize_l2};

use std::sync::Arc;

use tracing::{debug, trace};

/// High-level facade that wires store configuration and an embedding provider.
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    cfg: StoreConfig,
    provider: Arc<dyn EmbeddingsProvider>,
}

impl RagStore {
    /// Constructs a new store handle.
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration is invalid.
    pub fn new(cfg: StoreConfig, provider: Arc<dyn EmbeddingsProvider>) -> Result<Self, RagError> {
        cfg.validate()?;
        trace!("RagStore::new index={:?} meta={:?}", cfg.index_path, cfg.meta_path);
        Ok(Self { cfg, provider })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// True when both persisted files are present.
    pub fn exists(&self) -> bool {
        self.cfg.index_path.is_file() && self.cfg.meta_path.is_file()
    }

    /// Rebuilds the persisted store from the configured dataset.
    ///
    /// # Errors
    /// See [`IngestJob::run`].
    pub async fn ingest(&self, progress: Arc<dyn Progress>) -> Result<IngestStats, RagError> {
        debug!("RagStore::ingest dataset={:?}", self.cfg.dataset_path);
        IngestJob::from_config(self.provider.clone(), &self.cfg)
            .with_progress(progress)
            .run(
                &self.cfg.dataset_path,
                &self.cfg.index_path,
                &self.cfg.meta_path,
            )
            .await
    }

    /// Loads index + metadata and returns a retriever over them.
    ///
    /// # Errors
    /// I/O, decoding and alignment errors from the persisted files.
    pub fn open(&self) -> Result<Retriever, RagError> {
        let store = LoadedStore::load(&self.cfg.index_path, &self.cfg.meta_path)?;
        debug!(
            "RagStore::open entries={} dim={}",
            store.len(),
            store.dim()
        );
        Ok(Retriever::new(Arc::new(store), self.provider.clone()))
    }
}
