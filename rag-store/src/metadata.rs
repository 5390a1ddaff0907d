//! Ordinal-aligned record and text storage persisted as JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::RagError;
use crate::io_util::{StagedFile, stage};
use crate::record::Record;

/// `records[i]` and `texts[i]` describe index row `i`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataStore {
    records: Vec<Record>,
    texts: Vec<String>,
}

impl MetadataStore {
    /// Pairs records with their indexed texts.
    pub fn new(records: Vec<Record>, texts: Vec<String>) -> Result<Self, RagError> {
        let store = Self { records, texts };
        store.check_aligned()?;
        Ok(store)
    }

    /// Derives texts from the records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let texts = records.iter().map(Record::indexed_text).collect();
        Self { records, texts }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn get(&self, position: usize) -> Option<(&Record, &str)> {
        let rec = self.records.get(position)?;
        let text = self.texts.get(position)?;
        Some((rec, text.as_str()))
    }

    /// Fails unless records and texts have the same length as `vectors`.
    pub fn ensure_matches(&self, vectors: usize) -> Result<(), RagError> {
        if self.records.len() != vectors || self.texts.len() != vectors {
            return Err(RagError::Misaligned {
                vectors,
                records: self.records.len(),
                texts: self.texts.len(),
            });
        }
        Ok(())
    }

    /// Lowercase hex SHA-256 over the row count and every indexed text, in order.
    pub fn fingerprint(&self) -> String {
        let mut h = Sha256::new();
        h.update((self.texts.len() as u64).to_le_bytes());
        for t in &self.texts {
            h.update((t.len() as u64).to_le_bytes());
            h.update(t.as_bytes());
        }
        format!("{:x}", h.finalize())
    }

    fn check_aligned(&self) -> Result<(), RagError> {
        if self.records.len() != self.texts.len() {
            return Err(RagError::Misaligned {
                vectors: self.records.len(),
                records: self.records.len(),
                texts: self.texts.len(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        self.stage(path)?.commit()?;
        debug!("MetadataStore::save path={:?} entries={}", path, self.len());
        Ok(())
    }

    /// Writes the JSON next to `path` without replacing it yet.
    pub fn stage(&self, path: &Path) -> Result<StagedFile, RagError> {
        stage(path, |w| Ok(serde_json::to_writer(w, self)?))
    }

    pub fn load(path: &Path) -> Result<Self, RagError> {
        let r = BufReader::new(File::open(path)?);
        let store: Self = serde_json::from_reader(r)?;
        store.check_aligned()?;
        debug!("MetadataStore::load path={:?} entries={}", path, store.len());
        Ok(store)
    }
}
