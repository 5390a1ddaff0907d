//! Retrieval: embed the query, search the flat index, join with metadata.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::metadata::MetadataStore;
use crate::record::SearchResult;
use crate::vector_index::{FlatIpIndex, normalize_l2};

/// Index and metadata loaded together, ordinal-aligned.
#[derive(Clone, Debug)]
pub struct LoadedStore {
    index: FlatIpIndex,
    meta: MetadataStore,
}

impl LoadedStore {
    /// Pairs an index with its metadata.
    ///
    /// # Errors
    /// `Misaligned` when row, record and text counts differ,
    /// `FingerprintMismatch` when the index was built from other texts.
    pub fn new(index: FlatIpIndex, meta: MetadataStore) -> Result<Self, RagError> {
        meta.ensure_matches(index.len())?;
        if let Some(expected) = index.fingerprint() {
            let actual = meta.fingerprint();
            if expected != actual {
                return Err(RagError::FingerprintMismatch {
                    index: expected.to_string(),
                    metadata: actual,
                });
            }
        }
        Ok(Self { index, meta })
    }

    /// Loads both files written by the ingestion job.
    pub fn load(index_path: &Path, meta_path: &Path) -> Result<Self, RagError> {
        let index = FlatIpIndex::load(index_path)?;
        let meta = MetadataStore::load(meta_path)?;
        Self::new(index, meta)
    }

    pub fn index(&self) -> &FlatIpIndex {
        &self.index
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    /// Searches with an already-normalized query vector.
    ///
    /// Padding slots and hits scoring below `score_min` are dropped; the rest
    /// keep the index order (best first).
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        score_min: f32,
    ) -> Result<Vec<SearchResult>, RagError> {
        let neighbors = self.index.search(query, k)?;

        let out: Vec<SearchResult> = neighbors
            .into_iter()
            .filter(|n| n.score >= score_min)
            .filter_map(|n| {
                let (rec, text) = self.meta.get(n.position?)?;
                Some(SearchResult {
                    score: n.score,
                    text: text.to_string(),
                    meta: rec.clone(),
                })
            })
            .collect();

        trace!("LoadedStore::search k={} kept={}", k, out.len());
        Ok(out)
    }
}

/// Text-to-results retrieval over a [`LoadedStore`].
#[derive(Clone)]
pub struct Retriever {
    store: Arc<LoadedStore>,
    provider: Arc<dyn EmbeddingsProvider>,
}

impl Retriever {
    pub fn new(store: Arc<LoadedStore>, provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &LoadedStore {
        &self.store
    }

    /// Returns up to `k` results scoring at least `score_min`, best first.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    /// Embedding failures and query dimension mismatches.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        score_min: f32,
    ) -> Result<Vec<SearchResult>, RagError> {
        let mut qv = self.provider.embed(query).await?;
        normalize_l2(&mut qv);
        let hits = self.store.search(&qv, k, score_min)?;
        debug!(
            "retrieve k={} score_min={} hits={} top_tag={:?}",
            k,
            score_min,
            hits.len(),
            hits.first().map(|h| h.meta.tag.as_str())
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedFuture;
    use crate::record::Record;

    /// Maps known phrases onto fixed directions; anything else points along the last axis.
    struct KeywordEmbedder;

    impl EmbeddingsProvider for KeywordEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
            Box::pin(async move {
                let v = if text.contains("frais") {
                    vec![0.9, 0.1, 0.0]
                } else if text.contains("adresse") {
                    vec![0.1, 0.9, 0.0]
                } else {
                    vec![0.0, 0.0, 1.0]
                };
                Ok(v)
            })
        }
    }

    fn store() -> Arc<LoadedStore> {
        let records = vec![
            Record::new("Quels sont les frais ?", "FEES", "3000 DH par an."),
            Record::new("Quelle est l'adresse ?", "LOCATION", "Casablanca."),
        ];
        let index = FlatIpIndex::build(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]], true).unwrap();
        Arc::new(LoadedStore::new(index, MetadataStore::from_records(records)).unwrap())
    }

    #[tokio::test]
    async fn top_hit_is_the_matching_record() {
        let r = Retriever::new(store(), Arc::new(KeywordEmbedder));
        let hits = r.retrieve("Quels sont les frais d'inscription ?", 5, 0.2).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].meta.tag, "FEES");
        assert_eq!(hits[0].text, "Quels sont les frais ? || Réponse: 3000 DH par an.");
        assert!(hits[0].score > 0.9);
    }

    #[tokio::test]
    async fn results_are_sorted_and_bounded() {
        let r = Retriever::new(store(), Arc::new(KeywordEmbedder));
        let hits = r.retrieve("frais", 5, 0.0).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);

        let one = r.retrieve("frais", 1, 0.0).await.unwrap();
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn threshold_above_one_filters_everything() {
        let r = Retriever::new(store(), Arc::new(KeywordEmbedder));
        assert!(r.retrieve("frais", 5, 1.1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrelated_query_falls_below_threshold() {
        let r = Retriever::new(store(), Arc::new(KeywordEmbedder));
        assert!(r.retrieve("météo", 5, 0.2).await.unwrap().is_empty());
    }

    #[test]
    fn store_rejects_misaligned_parts() {
        let index = FlatIpIndex::build(&[vec![1.0, 0.0]], true).unwrap();
        let meta = MetadataStore::from_records(vec![Record::default(), Record::default()]);
        assert!(matches!(
            LoadedStore::new(index, meta),
            Err(RagError::Misaligned {
                vectors: 1,
                records: 2,
                ..
            })
        ));
    }

    #[test]
    fn store_rejects_index_built_from_other_texts() {
        let built_from = MetadataStore::from_records(vec![
            Record::new("fees?", "FEES", "3000"),
            Record::new("hours?", "LIB", "8-8"),
        ]);
        let swapped = MetadataStore::from_records(vec![
            Record::new("hours?", "LIB", "8-8"),
            Record::new("fees?", "FEES", "3000"),
        ]);
        let index = FlatIpIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0]], true)
            .unwrap()
            .with_fingerprint(built_from.fingerprint());

        assert!(LoadedStore::new(index.clone(), built_from).is_ok());
        assert!(matches!(
            LoadedStore::new(index, swapped),
            Err(RagError::FingerprintMismatch { .. })
        ));
    }
}
