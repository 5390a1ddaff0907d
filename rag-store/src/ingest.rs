//! Offline ingestion: dataset → indexed texts → embeddings → flat index + metadata.
//!
//! Both output files are replaced on every run. They are staged side by side
//! and only renamed into place once both are fully written.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::dataset::read_records;
use crate::embed::{DimGuard, EmbeddingsProvider};
use crate::errors::RagError;
use crate::metadata::MetadataStore;
use crate::progress::{NoopProgress, Progress};
use crate::vector_index::FlatIpIndex;

/// Summary of one ingestion run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub rows: usize,
    pub dim: usize,
    pub duration_ms: u128,
}

/// Builds the persisted store from a dataset.
pub struct IngestJob {
    provider: Arc<dyn EmbeddingsProvider>,
    batch_size: usize,
    embedding_dim: Option<usize>,
    progress: Arc<dyn Progress>,
}

impl IngestJob {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
            embedding_dim: None,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Job configured from a [`StoreConfig`] (batch size and expected dimension).
    pub fn from_config(provider: Arc<dyn EmbeddingsProvider>, cfg: &StoreConfig) -> Self {
        Self::new(provider, cfg.embed_batch_size).with_expected_dim(cfg.embedding_dim)
    }

    pub fn with_expected_dim(mut self, dim: Option<usize>) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the job end to end.
    ///
    /// # Errors
    /// Schema and I/O errors from the dataset, `EmptyDataset` when it has no
    /// rows, embedding failures, and write errors. Nothing is written unless
    /// every row was embedded.
    pub async fn run(
        &self,
        dataset_path: &Path,
        index_out: &Path,
        meta_out: &Path,
    ) -> Result<IngestStats, RagError> {
        let started = Instant::now();
        info!("Ingesting dataset {:?}", dataset_path);

        let records = read_records(dataset_path)?;
        if records.is_empty() {
            return Err(RagError::EmptyDataset(dataset_path.to_path_buf()));
        }
        let meta = MetadataStore::from_records(records);

        let vectors = self.embed_all(meta.texts()).await?;
        let index = FlatIpIndex::build(&vectors, true)?.with_fingerprint(meta.fingerprint());
        meta.ensure_matches(index.len())?;

        let staged_index = index.stage(index_out)?;
        let staged_meta = meta.stage(meta_out)?;
        staged_index.commit()?;
        staged_meta.commit()?;

        let stats = IngestStats {
            rows: index.len(),
            dim: index.dim(),
            duration_ms: started.elapsed().as_millis(),
        };
        self.progress.finish("Ingestion complete");
        info!(
            "Ingested {} rows (dim={}) into {:?} and {:?} in {} ms",
            stats.rows, stats.dim, index_out, meta_out, stats.duration_ms
        );
        Ok(stats)
    }

    /// Embeds `texts` batch by batch, keeping input order.
    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let total = texts.len();
        self.progress.set_total(total as u64);

        let mut guard = DimGuard::new(self.embedding_dim);
        let mut out: Vec<Vec<f32>> = Vec::with_capacity(total);

        for chunk in texts.chunks(self.batch_size) {
            let batch = self.provider.embed_many(chunk).await?;
            if batch.len() != chunk.len() {
                return Err(RagError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    batch.len(),
                    chunk.len()
                )));
            }
            for v in &batch {
                guard.check(v)?;
            }
            out.extend(batch);

            let msg = format!("Embeddings: {}/{}", out.len(), total);
            info!("  - {msg}");
            self.progress.advance(out.len() as u64, &msg);
        }

        debug!("embedded {} texts dim={:?}", out.len(), guard.dim());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::EmbedFuture;
    use crate::retrieve::LoadedStore;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic 3-d vectors from the text's bytes; records batch sizes.
    #[derive(Default)]
    struct HashEmbedder {
        batches: Mutex<Vec<usize>>,
    }

    fn vec_for(text: &str) -> Vec<f32> {
        let mut v = [1.0f32, 0.0, 0.0];
        for (i, b) in text.bytes().enumerate() {
            v[i % 3] += (b % 17) as f32;
        }
        v.to_vec()
    }

    impl EmbeddingsProvider for HashEmbedder {
        fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
            Box::pin(async move { Ok(vec_for(text)) })
        }

        fn embed_many<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
            Box::pin(async move {
                self.batches.lock().unwrap().push(texts.len());
                Ok(texts.iter().map(|t| vec_for(t)).collect())
            })
        }
    }

    struct CountingProgress(AtomicUsize);

    impl Progress for CountingProgress {
        fn advance(&self, _done: u64, _msg: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn dataset(dir: &tempfile::TempDir, rows: usize) -> std::path::PathBuf {
        let mut body = String::from("pattern,tag,response\n");
        for i in 0..rows {
            body.push_str(&format!("question {i},TAG{i},answer {i}\n"));
        }
        let p = dir.path().join("data.csv");
        std::fs::write(&p, body).unwrap();
        p
    }

    #[tokio::test]
    async fn every_row_becomes_one_aligned_vector() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset(&dir, 7);
        let index_out = dir.path().join("out/index.bin");
        let meta_out = dir.path().join("out/meta.json");

        let embedder = Arc::new(HashEmbedder::default());
        let progress = Arc::new(CountingProgress(AtomicUsize::new(0)));
        let job = IngestJob::new(embedder.clone(), 3).with_progress(progress.clone());
        let stats = job.run(&data, &index_out, &meta_out).await.unwrap();

        assert_eq!(stats.rows, 7);
        assert_eq!(stats.dim, 3);
        assert_eq!(*embedder.batches.lock().unwrap(), vec![3, 3, 1]);
        assert_eq!(progress.0.load(Ordering::SeqCst), 3);

        let store = LoadedStore::load(&index_out, &meta_out).unwrap();
        assert_eq!(store.len(), 7);
        let (rec, text) = store.metadata().get(4).unwrap();
        assert_eq!(rec.tag, "TAG4");
        assert_eq!(text, "question 4 || Réponse: answer 4");

        let mut q = vec_for(text);
        crate::vector_index::normalize_l2(&mut q);
        let hits = store.search(&q, 1, 0.0).unwrap();
        assert_eq!(hits[0].meta.tag, "TAG4");
    }

    #[tokio::test]
    async fn rerun_replaces_previous_store() {
        let dir = tempfile::tempdir().unwrap();
        let index_out = dir.path().join("index.bin");
        let meta_out = dir.path().join("meta.json");
        let job = IngestJob::new(Arc::new(HashEmbedder::default()), 32);

        let data = dataset(&dir, 5);
        job.run(&data, &index_out, &meta_out).await.unwrap();
        let data = dataset(&dir, 2);
        job.run(&data, &index_out, &meta_out).await.unwrap();

        assert_eq!(LoadedStore::load(&index_out, &meta_out).unwrap().len(), 2);
    }

    fn faq(dir: &tempfile::TempDir, name: &str, rows: &[(&str, &str, &str)]) -> std::path::PathBuf {
        let mut body = String::from("pattern,tag,response\n");
        for (p, t, r) in rows {
            body.push_str(&format!("{p},{t},{r}\n"));
        }
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn failed_rerun_keeps_previous_store_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let index_out = dir.path().join("index.bin");
        let meta_out = dir.path().join("meta.json");
        let job = IngestJob::new(Arc::new(HashEmbedder::default()), 32);

        let first = faq(&dir, "d1.csv", &[("fees?", "FEES", "3000"), ("hours?", "LIB", "8-8")]);
        job.run(&first, &index_out, &meta_out).await.unwrap();

        // Block the metadata temp file so the second run fails while writing.
        std::fs::create_dir(dir.path().join("meta.json.tmp")).unwrap();
        let second = faq(&dir, "d2.csv", &[("hours?", "LIB", "8-8"), ("fees?", "FEES", "3000")]);
        let err = job.run(&second, &index_out, &meta_out).await.unwrap_err();
        assert!(matches!(err, RagError::Io(_)));
        assert!(!dir.path().join("index.bin.tmp").exists());

        let store = LoadedStore::load(&index_out, &meta_out).unwrap();
        let mut q = vec_for("fees? || Réponse: 3000");
        crate::vector_index::normalize_l2(&mut q);
        let hits = store.search(&q, 1, 0.0).unwrap();
        assert_eq!(hits[0].meta.tag, "FEES");
        assert_eq!(hits[0].text, "fees? || Réponse: 3000");
    }

    #[tokio::test]
    async fn index_from_another_run_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let job = IngestJob::new(Arc::new(HashEmbedder::default()), 32);
        let (i1, m1) = (dir.path().join("i1.bin"), dir.path().join("m1.json"));
        let (i2, m2) = (dir.path().join("i2.bin"), dir.path().join("m2.json"));

        let first = faq(&dir, "d1.csv", &[("fees?", "FEES", "3000"), ("hours?", "LIB", "8-8")]);
        let second = faq(&dir, "d2.csv", &[("hours?", "LIB", "8-8"), ("fees?", "FEES", "3000")]);
        job.run(&first, &i1, &m1).await.unwrap();
        job.run(&second, &i2, &m2).await.unwrap();

        assert!(matches!(
            LoadedStore::load(&i2, &m1),
            Err(RagError::FingerprintMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn empty_dataset_is_an_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset(&dir, 0);
        let index_out = dir.path().join("index.bin");
        let meta_out = dir.path().join("meta.json");

        let job = IngestJob::new(Arc::new(HashEmbedder::default()), 32);
        let err = job.run(&data, &index_out, &meta_out).await.unwrap_err();
        assert!(matches!(err, RagError::EmptyDataset(_)));
        assert!(!index_out.exists());
        assert!(!meta_out.exists());
    }

    #[tokio::test]
    async fn expected_dimension_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset(&dir, 2);
        let job = IngestJob::new(Arc::new(HashEmbedder::default()), 32).with_expected_dim(Some(8));
        let err = job
            .run(&data, &dir.path().join("i.bin"), &dir.path().join("m.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 3, want: 8 }));
    }
}
