//! Exact flat inner-product index over dense `f32` rows.
//!
//! Rows are stored contiguously; with unit-norm rows and queries the inner
//! product is cosine similarity. Search is brute force over every row.
//!
//! The file header may carry the fingerprint of the metadata texts the rows
//! were embedded from, so a mismatched metadata file is detected on load.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::RagError;
use crate::io_util::{StagedFile, stage};

const INDEX_MAGIC: &[u8; 8] = b"FAQFLAT\0";
const INDEX_VERSION: u32 = 2;

/// Score reported for padding slots when fewer than `k` rows exist.
pub const SENTINEL_SCORE: f32 = f32::MIN;

/// One search slot. `position` is `None` when the slot is padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub score: f32,
    pub position: Option<usize>,
}

impl Neighbor {
    fn padding() -> Self {
        Self {
            score: SENTINEL_SCORE,
            position: None,
        }
    }
}

/// Scales `v` in place to unit L2 norm. A zero vector stays zero.
pub fn normalize_l2(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Serialize, Deserialize)]
struct IndexBody {
    version: u32,
    dim: u32,
    fingerprint: Option<String>,
    data: Vec<f32>,
}

/// In-memory exact inner-product index.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
    fingerprint: Option<String>,
}

impl FlatIpIndex {
    /// Builds an index from `vectors`, in order. Row `i` is vector `i`.
    ///
    /// With `normalize` set, every row is scaled to unit norm first.
    ///
    /// # Errors
    /// `InvalidIndex` for no rows or zero-length rows, `VectorSizeMismatch`
    /// when rows disagree on length.
    pub fn build(vectors: &[Vec<f32>], normalize: bool) -> Result<Self, RagError> {
        let first = vectors
            .first()
            .ok_or_else(|| RagError::InvalidIndex("cannot build an index from zero vectors".into()))?;
        let dim = first.len();
        if dim == 0 {
            return Err(RagError::InvalidIndex("vectors have zero dimension".into()));
        }

        let mut data = Vec::with_capacity(dim * vectors.len());
        for v in vectors {
            if v.len() != dim {
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: dim,
                });
            }
            let start = data.len();
            data.extend_from_slice(v);
            if normalize {
                normalize_l2(&mut data[start..]);
            }
        }

        debug!("FlatIpIndex::build rows={} dim={}", vectors.len(), dim);
        Ok(Self {
            dim,
            data,
            fingerprint: None,
        })
    }

    /// Tags the index with the fingerprint of the texts its rows came from.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `position`, if it exists.
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Returns exactly `k` slots, best first.
    ///
    /// Equal scores keep the lower position first. Slots beyond the number of
    /// stored rows are padding (`position == None`). The query is used as given;
    /// normalize it beforehand for cosine scores.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RagError> {
        if query.len() != self.dim {
            return Err(RagError::DimensionMismatch {
                index: self.dim,
                query: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (dot(row, query), i))
            .collect();

        scored.sort_by(|a, b| match b.0.total_cmp(&a.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });
        scored.truncate(k);

        let mut out: Vec<Neighbor> = scored
            .into_iter()
            .map(|(score, i)| Neighbor {
                score,
                position: Some(i),
            })
            .collect();
        out.resize(k, Neighbor::padding());

        trace!("FlatIpIndex::search k={} rows={}", k, self.len());
        Ok(out)
    }

    /// Writes the index to `path` (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        self.stage(path)?.commit()?;
        debug!("FlatIpIndex::save path={:?} rows={}", path, self.len());
        Ok(())
    }

    /// Writes the index next to `path` without replacing it yet.
    pub fn stage(&self, path: &Path) -> Result<StagedFile, RagError> {
        let dim = u32::try_from(self.dim)
            .map_err(|_| RagError::InvalidIndex(format!("dimension {} too large", self.dim)))?;
        let body = IndexBody {
            version: INDEX_VERSION,
            dim,
            fingerprint: self.fingerprint.clone(),
            data: self.data.clone(),
        };
        stage(path, |w| {
            w.write_all(INDEX_MAGIC)?;
            bincode::serialize_into(w, &body)?;
            Ok(())
        })
    }

    /// Reads an index previously written by [`FlatIpIndex::save`].
    ///
    /// # Errors
    /// `InvalidIndex` for a foreign file, unknown version or a body whose
    /// length is not a multiple of the dimension.
    pub fn load(path: &Path) -> Result<Self, RagError> {
        let mut r = BufReader::new(File::open(path)?);

        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                RagError::InvalidIndex(format!("{} is too short", path.display()))
            }
            _ => RagError::Io(e),
        })?;
        if &magic != INDEX_MAGIC {
            return Err(RagError::InvalidIndex(format!(
                "{} is not a flat index file",
                path.display()
            )));
        }

        let body: IndexBody = bincode::deserialize_from(r)?;
        if body.version != INDEX_VERSION {
            return Err(RagError::InvalidIndex(format!(
                "unsupported index version {} (expected {})",
                body.version, INDEX_VERSION
            )));
        }
        let dim = body.dim as usize;
        if dim == 0 || body.data.is_empty() || body.data.len() % dim != 0 {
            return Err(RagError::InvalidIndex(format!(
                "body of {} floats does not fit dimension {}",
                body.data.len(),
                dim
            )));
        }

        let idx = Self {
            dim,
            data: body.data,
            fingerprint: body.fingerprint,
        };
        debug!("FlatIpIndex::load path={:?} rows={} dim={}", path, idx.len(), dim);
        Ok(idx)
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unit(v: &[f32]) -> Vec<f32> {
        let mut v = v.to_vec();
        normalize_l2(&mut v);
        v
    }

    #[test]
    fn normalize_makes_unit_norm_and_keeps_zero() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut z = vec![0.0, 0.0, 0.0];
        normalize_l2(&mut z);
        assert_eq!(z, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn build_normalizes_rows() {
        let idx = FlatIpIndex::build(&[vec![2.0, 0.0], vec![0.0, 5.0]], true).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.dim(), 2);
        assert_eq!(idx.row(0).unwrap(), &[1.0, 0.0]);
        assert_eq!(idx.row(1).unwrap(), &[0.0, 1.0]);
        assert!(idx.row(2).is_none());
    }

    #[test]
    fn build_rejects_empty_and_ragged_input() {
        assert!(matches!(
            FlatIpIndex::build(&[], true),
            Err(RagError::InvalidIndex(_))
        ));
        assert!(matches!(
            FlatIpIndex::build(&[vec![1.0, 0.0], vec![1.0]], true),
            Err(RagError::VectorSizeMismatch { got: 1, want: 2 })
        ));
    }

    #[test]
    fn search_ranks_by_inner_product() {
        let idx = FlatIpIndex::build(
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            true,
        )
        .unwrap();
        let hits = idx.search(&unit(&[1.0, 0.1]), 3).unwrap();
        let order: Vec<_> = hits.iter().map(|n| n.position).collect();
        assert_eq!(order, vec![Some(0), Some(2), Some(1)]);
        assert!(hits[0].score <= 1.0 + 1e-6);
    }

    #[test]
    fn search_pads_with_sentinels() {
        let idx = FlatIpIndex::build(&[vec![1.0, 0.0], vec![0.0, 1.0]], true).unwrap();
        let hits = idx.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits[..2].iter().all(|n| n.position.is_some()));
        assert!(hits[2..].iter().all(|n| n.position.is_none()));
        assert_eq!(hits[4].score, SENTINEL_SCORE);
    }

    #[test]
    fn search_breaks_ties_by_position() {
        let idx = FlatIpIndex::build(&[vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]], true)
            .unwrap();
        let hits = idx.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].position, Some(1));
        assert_eq!(hits[1].position, Some(2));
    }

    #[test]
    fn search_with_zero_k_is_empty() {
        let idx = FlatIpIndex::build(&[vec![1.0]], true).unwrap();
        assert!(idx.search(&[1.0], 0).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let idx = FlatIpIndex::build(&[vec![1.0, 0.0]], true).unwrap();
        assert!(matches!(
            idx.search(&[1.0, 0.0, 0.0], 1),
            Err(RagError::DimensionMismatch { index: 2, query: 3 })
        ));
    }

    #[test]
    fn save_and_load_answer_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store/index.bin");

        let idx = FlatIpIndex::build(
            &[vec![0.3, 0.1, 0.9], vec![0.5, 0.5, 0.0], vec![-1.0, 0.2, 0.2]],
            true,
        )
        .unwrap()
        .with_fingerprint("abc123");
        idx.save(&path).unwrap();
        let loaded = FlatIpIndex::load(&path).unwrap();

        assert_eq!(loaded, idx);
        assert_eq!(loaded.fingerprint(), Some("abc123"));
        let q = unit(&[0.4, 0.4, 0.1]);
        assert_eq!(loaded.search(&q, 4).unwrap(), idx.search(&q, 4).unwrap());
    }

    #[test]
    fn load_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        std::fs::write(&path, b"definitely not an index").unwrap();
        assert!(matches!(
            FlatIpIndex::load(&path),
            Err(RagError::InvalidIndex(_))
        ));

        std::fs::write(&path, b"FAQ").unwrap();
        assert!(matches!(
            FlatIpIndex::load(&path),
            Err(RagError::InvalidIndex(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        let body = IndexBody {
            version: INDEX_VERSION + 1,
            dim: 1,
            fingerprint: None,
            data: vec![1.0],
        };
        let mut bytes = INDEX_MAGIC.to_vec();
        bytes.extend(bincode::serialize(&body).unwrap());
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            FlatIpIndex::load(&path),
            Err(RagError::InvalidIndex(_))
        ));
    }

    fn rows_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
        prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 4), 1..24)
    }

    proptest! {
        #[test]
        fn search_returns_k_slots_in_descending_order(
            rows in rows_strategy(),
            query in prop::collection::vec(-10.0f32..10.0, 4),
            k in 0usize..32,
        ) {
            let idx = FlatIpIndex::build(&rows, true).unwrap();
            let mut q = query;
            normalize_l2(&mut q);
            let hits = idx.search(&q, k).unwrap();

            prop_assert_eq!(hits.len(), k);
            let real = hits.iter().take_while(|n| n.position.is_some()).count();
            prop_assert_eq!(real, k.min(rows.len()));
            prop_assert!(hits[real..].iter().all(|n| n.position.is_none()));
            for w in hits[..real].windows(2) {
                prop_assert!(w[0].score >= w[1].score);
            }
            for n in &hits[..real] {
                prop_assert!(n.score <= 1.0 + 1e-4);
            }
        }
    }
}
